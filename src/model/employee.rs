use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "John Doe",
        "email": "john.doe@company.com",
        "department": "Engineering",
        "position": "Software Developer",
        "nfc_card_id": "04E91A2A3B5C80",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john.doe@company.com", nullable = true)]
    pub email: Option<String>,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = "Software Developer", nullable = true)]
    pub position: Option<String>,

    /// Badge identifier read from the physical NFC card. At most one
    /// active employee may hold a given card id (unique index).
    #[schema(example = "04E91A2A3B5C80", nullable = true)]
    pub nfc_card_id: Option<String>,

    #[schema(example = "active")]
    pub status: String,
}
