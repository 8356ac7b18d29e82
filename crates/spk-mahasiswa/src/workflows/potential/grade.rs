use crate::table::Cell;

/// Letter grades and their numeric equivalents.
const GRADE_TABLE: [(&str, u8); 6] = [
    ("A", 90),
    ("B", 80),
    ("C", 70),
    ("D", 60),
    ("E", 50),
    ("F", 40),
];

/// Converts a letter grade to its numeric score.
///
/// Anything outside the table, including blanks, scores 0 rather than failing.
pub fn grade_to_numeric(grade: &str) -> u8 {
    let grade = grade.trim();
    GRADE_TABLE
        .iter()
        .find(|(letter, _)| *letter == grade)
        .map(|(_, score)| *score)
        .unwrap_or(0)
}

/// Cell-level variant used while deriving roster columns. Numbers are not grades.
pub(crate) fn cell_to_numeric(cell: &Cell) -> u8 {
    cell.as_text().map(grade_to_numeric).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_letter_grade() {
        let scores: Vec<u8> = ["A", "B", "C", "D", "E", "F"]
            .into_iter()
            .map(grade_to_numeric)
            .collect();
        assert_eq!(scores, vec![90, 80, 70, 60, 50, 40]);
    }

    #[test]
    fn unknown_grades_score_zero() {
        for grade in ["Z", "", "  ", "a", "A+", "AB"] {
            assert_eq!(grade_to_numeric(grade), 0, "grade {grade:?}");
        }
    }

    #[test]
    fn cells_without_letters_score_zero() {
        assert_eq!(cell_to_numeric(&Cell::text("B")), 80);
        assert_eq!(cell_to_numeric(&Cell::Empty), 0);
        assert_eq!(cell_to_numeric(&Cell::Number(90.0)), 0);
    }
}
