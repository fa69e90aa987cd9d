use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Same set of characters a browser's `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Deep link that opens the native messaging app with `body` prefilled.
pub fn deep_link(phone_number: &str, body: &str) -> String {
    format!(
        "sms:{}&body={}",
        phone_number.trim(),
        utf8_percent_encode(body, COMPONENT)
    )
}
