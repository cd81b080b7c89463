//! The validator dialect: `bsonType` names, `$jsonSchema` documents and
//! collection validators with their level and action.

pub mod bson_type;
pub mod json_schema;
pub mod validator;

pub use bson_type::{as_date, date_value, BsonType};
pub use json_schema::{JsonSchema, TypeSet, Violation, ViolationKind};
pub use validator::{ValidationAction, ValidationLevel, Validator};
