use rand::{distributions::Alphanumeric, thread_rng, Rng};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// `<base36 millis>-<6 lowercase alphanumerics>`, the shape existing assessment ids have.
pub fn generate_assessment_id(now_millis: i64) -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}-{}", to_base36(now_millis.max(0) as u64), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn id_shape() {
        let id = generate_assessment_id(1_700_000_000_000);
        let (head, tail) = id.split_once('-').unwrap();
        assert_eq!(head, "loyw3v28");
        assert_eq!(tail.len(), 6);
    }
}
