use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::normalize::normalize_name;

/// Fresh record id: millisecond timestamp plus a random suffix.
pub fn new_record_id(prefix: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u16 = rand::thread_rng().gen();
    format!("{prefix}-{millis}-{suffix:04x}")
}

/// A model profile. Only `id` and `name` matter for reconciliation; every
/// other profile field rides along untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Model {
    #[cfg(test)]
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Espèces")]
    Cash,
    #[serde(rename = "Virement")]
    Transfer,
    #[serde(rename = "Autre")]
    Other,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Espèces",
            Self::Transfer => "Virement",
            Self::Other => "Autre",
        }
    }

    /// Loose mapping used for imported data and CLI input.
    pub fn from_loose(raw: &str) -> Self {
        let s = raw.trim().to_lowercase();
        if s.contains("cash") || s.starts_with("esp") {
            Self::Cash
        } else if s.contains("bank") || s.contains("virement") {
            Self::Transfer
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "Payé")]
    Paid,
    #[serde(rename = "En attente")]
    Pending,
    #[serde(rename = "En retard")]
    Overdue,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Paid => "Payé",
            Self::Pending => "En attente",
            Self::Overdue => "En retard",
        }
    }

    /// Accepts the French labels, with or without accents or hyphens, and
    /// their English equivalents. Anything unrecognized counts as paid.
    pub fn from_loose(raw: &str) -> Self {
        let s = normalize_name(&raw.replace(['-', '_'], " "));
        match s.as_str() {
            "en attente" | "pending" | "partial" => Self::Pending,
            "en retard" | "late" | "overdue" | "unpaid" => Self::Overdue,
            _ => Self::Paid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    pub model_id: String,
    #[serde(default)]
    pub model_name: String,
    /// `YYYY-MM`
    pub month: String,
    pub amount: f64,
    pub method: PaymentMethod,
    /// `YYYY-MM-DD`, sometimes with a time component appended.
    pub payment_date: String,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PaymentRecord {
    /// The calendar day of `payment_date`, ignoring any time component.
    pub fn day(&self) -> &str {
        self.payment_date.get(..10).unwrap_or(&self.payment_date)
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingTransaction {
    pub id: String,
    #[serde(default)]
    pub date: String,
    /// Usually `revenue` or `expense`; exports from older versions carry
    /// other values, so this stays a free string.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_model_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastingApplication {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub submission_date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub id: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub submitted_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub submitted_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FashionDayReservation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub submitted_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Every collection the store holds, loaded or saved as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub models: Vec<Model>,
    #[serde(default)]
    pub monthly_payments: Vec<PaymentRecord>,
    #[serde(default)]
    pub accounting_transactions: Vec<AccountingTransaction>,
    #[serde(default)]
    pub casting_applications: Vec<CastingApplication>,
    #[serde(default)]
    pub booking_requests: Vec<BookingRequest>,
    #[serde(default)]
    pub contact_messages: Vec<ContactMessage>,
    #[serde(default)]
    pub fashion_day_reservations: Vec<FashionDayReservation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_record_uses_french_labels() {
        let record = PaymentRecord {
            id: "p1".to_string(),
            model_id: "m1".to_string(),
            model_name: "Ada".to_string(),
            month: "2025-03".to_string(),
            amount: 1500.0,
            method: PaymentMethod::Cash,
            payment_date: "2025-03-05".to_string(),
            status: PaymentStatus::Pending,
            notes: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["modelId"], "m1");
        assert_eq!(json["method"], "Espèces");
        assert_eq!(json["status"], "En attente");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn test_model_keeps_profile_fields() {
        let raw = r#"{"id":"m1","name":"Ada","height":178,"city":"Paris"}"#;
        let model: Model = serde_json::from_str(raw).unwrap();
        assert_eq!(model.extra["height"], 178);
        let back = serde_json::to_value(&model).unwrap();
        assert_eq!(back["city"], "Paris");
    }

    #[test]
    fn test_method_from_loose() {
        assert_eq!(PaymentMethod::from_loose("cash"), PaymentMethod::Cash);
        assert_eq!(PaymentMethod::from_loose("Espèces"), PaymentMethod::Cash);
        assert_eq!(PaymentMethod::from_loose("bank_transfer"), PaymentMethod::Transfer);
        assert_eq!(PaymentMethod::from_loose("Virement SEPA"), PaymentMethod::Transfer);
        assert_eq!(PaymentMethod::from_loose("cheque"), PaymentMethod::Other);
        assert_eq!(PaymentMethod::from_loose(""), PaymentMethod::Other);
    }

    #[test]
    fn test_status_from_loose() {
        assert_eq!(PaymentStatus::from_loose("En attente"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_loose("overdue"), PaymentStatus::Overdue);
        assert_eq!(PaymentStatus::from_loose("Payé"), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_loose("en-retard"), PaymentStatus::Overdue);
        assert_eq!(PaymentStatus::from_loose("EN_ATTENTE"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_loose("whatever"), PaymentStatus::Paid);
    }

    #[test]
    fn test_day_strips_time_component() {
        let json = r#"{"id":"p","modelId":"m","month":"2025-01","amount":1,
            "method":"Autre","paymentDate":"2025-01-05T10:00:00Z","status":"Payé"}"#;
        let record: PaymentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.day(), "2025-01-05");
    }
}
