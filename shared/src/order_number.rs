use chrono::{DateTime, Utc};
use rand::Rng;

const PREFIX: &str = "SUCAMEC";
const SUFFIX_LEN: usize = 5;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Builds a customer-facing order number: `SUCAMEC-<unix millis>-<5 base36 chars>`.
pub fn generate_order_number<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}-{}", PREFIX, now.timestamp_millis(), suffix)
}

pub fn new_order_number() -> String {
    generate_order_number(Utc::now(), &mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn order_number_has_timestamp_and_uppercase_suffix() {
        let now = Utc.timestamp_millis_opt(1_717_171_717_171).unwrap();
        let number = generate_order_number(now, &mut StdRng::seed_from_u64(7));

        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "SUCAMEC");
        assert_eq!(parts[1], "1717171717171");
        assert_eq!(parts[2].len(), 5);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn seeded_generators_are_reproducible() {
        let now = Utc::now();
        let a = generate_order_number(now, &mut StdRng::seed_from_u64(42));
        let b = generate_order_number(now, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
