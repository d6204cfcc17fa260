use rand::{distributions::Uniform, thread_rng, Rng};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Join code shown to students. Skips look-alike characters (0/O, 1/I).
pub fn generate_course_code(length: usize) -> String {
    let dist = Uniform::from(0..CODE_ALPHABET.len());
    thread_rng()
        .sample_iter(dist)
        .take(length)
        .map(|i| CODE_ALPHABET[i] as char)
        .collect()
}

pub fn normalize_course_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_use_the_alphabet() {
        let code = generate_course_code(8);
        assert_eq!(code.len(), 8);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn normalizes_user_input() {
        assert_eq!(normalize_course_code("  ab3k9xyz "), "AB3K9XYZ");
    }
}
