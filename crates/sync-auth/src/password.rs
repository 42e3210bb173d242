/// Derives the backend account password from the user-facing gate.
///
/// `gate || "_" || appPrefix` guarantees a minimum length (Supabase rejects
/// passwords under 6 chars, and a 4-digit PIN alone is too short) without
/// adding entropy the user didn't provide.
pub fn derive_password(gate: &str, app_prefix: &str) -> String {
 format!("{gate}_{app_prefix}")
}

#[cfg(test)]
mod tests {
 use super::*;

 #[test]
 fn derives_password_by_appending_prefix() {
 assert_eq!(derive_password("1234", "acme"), "1234_acme");
 }

 #[test]
 fn distinct_gates_derive_distinct_passwords() {
 assert_ne!(derive_password("1234", "acme"), derive_password("5678", "acme"));
 }
}
