/// Derives a human-readable device label from a raw user-agent string.
///
/// The match table is priority-ordered, not alphabetical: mobile OS checks
/// must precede desktop OS checks because mobile user-agent strings embed
/// desktop OS substrings (iOS Safari's UA contains "like Mac OS X"; Android
/// Chrome's UA contains "Linux"), and Edge must be matched before Chrome
/// because Edge's UA carries a trailing "Chrome/..." token for compatibility.
pub fn device_label(user_agent: &str) -> String {
 let os = detect_os(user_agent);
 let browser = detect_browser(user_agent);
 format!("{browser} on {os}")
}

fn detect_os(ua: &str) -> &'static str {
 // Mobile first.
 if ua.contains("iPhone") {
 "iOS"
 } else if ua.contains("iPad") {
 "iPadOS"
 } else if ua.contains("Android") {
 "Android"
 // Desktop.
 } else if ua.contains("Windows") {
 "Windows"
 } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
 "macOS"
 } else if ua.contains("Linux") {
 "Linux"
 } else {
 "an unknown OS"
 }
}

fn detect_browser(ua: &str) -> &'static str {
 // Edge and Opera both carry a trailing "Chrome/..." token; check them
 // before the generic Chrome match.
 if ua.contains("Edg/") || ua.contains("Edge/") {
 "Edge"
 } else if ua.contains("OPR/") || ua.contains("Opera") {
 "Opera"
 } else if ua.contains("Firefox") {
 "Firefox"
 } else if ua.contains("CriOS") || ua.contains("Chrome") {
 "Chrome"
 } else if ua.contains("Safari") {
 "Safari"
 } else {
 "an unknown browser"
 }
}

#[cfg(test)]
mod tests {
 use super::*;

 #[test]
 fn android_chrome_is_not_misread_as_linux() {
 let ua = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Chrome/120.0 Mobile Safari/537.36";
 assert_eq!(device_label(ua), "Chrome on Android");
 }

 #[test]
 fn iphone_safari_is_not_misread_as_macos() {
 let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Version/17.0 Mobile/15E148 Safari/604.1";
 assert_eq!(device_label(ua), "Safari on iOS");
 }

 #[test]
 fn edge_is_not_misread_as_chrome() {
 let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36 Edg/120.0";
 assert_eq!(device_label(ua), "Edge on Windows");
 }

 #[test]
 fn desktop_chrome_on_macos() {
 let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";
 assert_eq!(device_label(ua), "Chrome on macOS");
 }

 #[test]
 fn unrecognized_user_agent_falls_back_gracefully() {
 assert_eq!(device_label("curl/8.0"), "an unknown browser on an unknown OS");
 }
}
