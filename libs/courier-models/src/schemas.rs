/// Avro schema of [`crate::UserCreated`].
pub const USER_CREATED: &str = r#"{
    "type": "record",
    "name": "UserCreated",
    "fields": [
        {"name": "id", "type": "string"},
        {"name": "email", "type": "string"},
        {"name": "name", "type": "string"}
    ]
}"#;

/// Every schema known to this crate, keyed by the name used for registry
/// subjects (`{name}-value`).
pub const CATALOG: &[(&str, &str)] = &[("UserCreated", USER_CREATED)];

/// Schema JSON registered under `name`.
pub fn lookup(name: &str) -> Option<&'static str> {
    CATALOG
        .iter()
        .find(|(entry, _)| *entry == name)
        .map(|(_, schema)| *schema)
}

#[cfg(test)]
mod tests {
    use apache_avro::Schema;

    use super::*;

    #[test]
    fn every_catalog_entry_parses() {
        for (name, json) in CATALOG {
            let schema = Schema::parse_str(json).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert!(matches!(schema, Schema::Record(_)), "{name} is not a record");
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(lookup("UserCreated"), Some(USER_CREATED));
        assert_eq!(lookup("usercreated"), None);
        assert_eq!(lookup(""), None);
    }
}
