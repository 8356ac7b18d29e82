use serde::{Deserialize, Serialize};

/// Study track inferred from the two core subject grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Specialization {
    #[serde(rename = "Kodingan")]
    Coding,
    #[serde(rename = "Data")]
    Data,
    #[serde(rename = "Tidak Diketahui")]
    Unknown,
}

impl Specialization {
    pub fn label(self) -> &'static str {
        match self {
            Specialization::Coding => "Kodingan",
            Specialization::Data => "Data",
            Specialization::Unknown => "Tidak Diketahui",
        }
    }

    /// The stronger subject wins; a tie is always `Unknown`, whatever the project score.
    pub fn classify(algo_numeric: f64, stat_numeric: f64, _project_score: f64) -> Self {
        if algo_numeric > stat_numeric {
            Specialization::Coding
        } else if stat_numeric > algo_numeric {
            Specialization::Data
        } else {
            Specialization::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stronger_subject_decides_track() {
        assert_eq!(Specialization::classify(90.0, 80.0, 50.0), Specialization::Coding);
        assert_eq!(Specialization::classify(70.0, 90.0, 50.0), Specialization::Data);
    }

    #[test]
    fn ties_are_unknown_regardless_of_project_score() {
        assert_eq!(Specialization::classify(80.0, 80.0, 95.0), Specialization::Unknown);
        assert_eq!(Specialization::classify(80.0, 80.0, 10.0), Specialization::Unknown);
        assert_eq!(Specialization::classify(0.0, 0.0, 0.0), Specialization::Unknown);
        assert_eq!(Specialization::Unknown.label(), "Tidak Diketahui");
    }
}
