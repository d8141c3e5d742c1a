/// Restaurant entities as stored in the document store
///
/// # Models
///
/// - `user`: staff accounts and their current token pair
/// - `order`: orders, optionally seated at a table
/// - `table`: dining tables referenced by orders
///
/// Every entity has two identifiers: the internal `_id` (a UUID) and a public
/// id used in URLs, which is the lowercase hex of the internal id's bytes.
///
/// ```
/// use restaurant_shared::models::{new_identity, public_id};
///
/// let (id, public) = new_identity();
/// assert_eq!(public, public_id(&id));
/// assert_eq!(public.len(), 32);
/// ```

pub mod order;
pub mod table;
pub mod user;

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

/// Public identifier derived from an internal id
pub fn public_id(id: &Uuid) -> String {
    hex::encode(id.as_bytes())
}

/// Fresh internal id together with its public id
pub fn new_identity() -> (Uuid, String) {
    let id = Uuid::new_v4();
    let public = public_id(&id);
    (id, public)
}

/// Current instant, truncated to whole seconds
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_public_id_is_hex_of_internal_id() {
        let id = Uuid::parse_str("65f1c0de-0000-4000-8000-00000000abcd").unwrap();
        assert_eq!(public_id(&id), "65f1c0de00004000800000000000abcd");
        assert_eq!(public_id(&id), id.simple().to_string());
    }

    #[test]
    fn test_public_id_is_deterministic() {
        let id = Uuid::new_v4();
        assert_eq!(public_id(&id), public_id(&id));
    }

    #[test]
    fn test_new_identities_differ() {
        let (a, pa) = new_identity();
        let (b, pb) = new_identity();
        assert_ne!(a, b);
        assert_ne!(pa, pb);
    }

    #[test]
    fn test_now_has_no_subseconds() {
        assert_eq!(now().nanosecond(), 0);
    }
}
