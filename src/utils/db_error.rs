/// Name of the `(student_id, date)` uniqueness constraint in the schema.
pub const STUDENT_DATE_CONSTRAINT: &str = "attendance_student_date_key";

pub fn is_unique_violation_on_student_date(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    matches!(db_err.constraint(), Some(STUDENT_DATE_CONSTRAINT))
}
