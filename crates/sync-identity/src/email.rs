/// Masks an email for display: keeps the first two characters of the local
/// part, pads the remainder with `•`, and keeps the domain intact.
pub fn mask_email(email: &str) -> String {
 let Some((local, domain)) = email.split_once('@') else {
 return email.to_string();
 };

 let visible: String = local.chars().take(2).collect();
 let hidden_len = local.chars().count().saturating_sub(visible.chars().count());
 let padding: String = std::iter::repeat('•').take(hidden_len).collect();

 format!("{visible}{padding}@{domain}")
}
