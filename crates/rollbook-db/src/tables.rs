use redb::TableDefinition;

/// Table for storing students.
/// Key: student id
/// Value: serialized Student as bytes
pub const STUDENTS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("students");

/// Unique index from roll to student id.
pub const ROLLS_TABLE: TableDefinition<&str, i64> = TableDefinition::new("rolls");

/// Table for storing marks.
/// Key: (student_id, subject) as bytes, see `encode_mark_key`
/// Value: mark
pub const MARKS_TABLE: TableDefinition<&[u8], f64> = TableDefinition::new("marks");

/// Table for cumulative attendance.
/// Key: student id
/// Value: (present days, total days)
pub const ATTENDANCE_TABLE: TableDefinition<i64, (u32, u32)> = TableDefinition::new("attendance");

/// Table for counters.
/// Key: counter name
/// Value: last issued value
pub const COUNTERS_TABLE: TableDefinition<&str, i64> = TableDefinition::new("counters");

/// Counter holding the last assigned student id.
pub const STUDENT_ID_COUNTER: &str = "student_id";

/// Encode a mark key: big-endian student id followed by the subject.
pub fn encode_mark_key(student_id: i64, subject: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + subject.len());
    key.extend_from_slice(&student_id.to_be_bytes());
    key.extend_from_slice(subject.as_bytes());
    key
}

/// Decode a mark key. Returns None for malformed keys.
pub fn decode_mark_key(bytes: &[u8]) -> Option<(i64, String)> {
    if bytes.len() < 8 {
        return None;
    }
    let student_id = i64::from_be_bytes(bytes[..8].try_into().ok()?);
    let subject = String::from_utf8(bytes[8..].to_vec()).ok()?;
    Some((student_id, subject))
}

/// Key bounds covering every mark of one student.
pub fn mark_key_range(student_id: i64) -> ([u8; 8], [u8; 8]) {
    (
        student_id.to_be_bytes(),
        student_id.saturating_add(1).to_be_bytes(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_key_decode() {
        let key = encode_mark_key(42, "Physics");
        assert_eq!(decode_mark_key(&key), Some((42, "Physics".to_string())));
        assert_eq!(decode_mark_key(&[1, 2, 3]), None);
    }

    #[test]
    fn test_mark_keys_group_by_student() {
        let (lo, hi) = mark_key_range(7);
        let own = encode_mark_key(7, "Zoology");
        let next = encode_mark_key(8, "Art");
        let prev = encode_mark_key(6, "Zoology");

        assert!(lo.as_slice() <= own.as_slice() && own.as_slice() < hi.as_slice());
        assert!(next.as_slice() >= hi.as_slice());
        assert!(prev.as_slice() < lo.as_slice());
    }
}
