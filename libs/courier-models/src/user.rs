use std::sync::LazyLock;

use apache_avro::Schema;
use serde::{Deserialize, Serialize};

use courier_api::Record;

use crate::schemas::USER_CREATED;

static SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::parse_str(USER_CREATED).expect("UserCreated schema literal is valid avro")
});

/// Emitted once a user account exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreated {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl Record for UserCreated {
    fn schema() -> &'static Schema {
        &SCHEMA
    }

    /// Messages for the same user land on the same partition.
    fn partition_key(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_describes_three_string_fields() {
        let Schema::Record(record) = UserCreated::schema() else {
            panic!("expected a record schema");
        };
        assert_eq!(record.name.name, "UserCreated");
        let names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "email", "name"]);
        assert!(record.fields.iter().all(|f| f.schema == Schema::String));
    }

    #[test]
    fn partition_key_is_user_id() {
        let event = UserCreated {
            id: "u-42".into(),
            email: "john@doe.com".into(),
            name: "john doe".into(),
        };
        assert_eq!(event.partition_key(), "u-42");
    }
}
