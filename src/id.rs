//! Random identifiers for workbooks, sheets and charts.

use uuid::Uuid;

/// Generate a random version-4 UUID string, e.g.
/// `"3f2b8c1e-9a4d-4c6b-8e2f-1a2b3c4d5e6f"`.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id();
        assert_eq!(id.len(), 36);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(
            parts.iter().map(|p| p.len()).collect::<Vec<_>>(),
            vec![8, 4, 4, 4, 12]
        );
        assert!(parts[2].starts_with('4'));
        assert_eq!(Uuid::parse_str(&id).unwrap().get_version_num(), 4);
    }

    #[test]
    fn test_generate_id_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
