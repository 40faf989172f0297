use async_trait::async_trait;

/// Decides whether a business registration code identifies a real business.
#[async_trait]
pub trait BusinessRegistry: Send + Sync {
    async fn is_valid(&self, code: &str) -> anyhow::Result<bool>;
}

/// Offline check of the 10-digit Korean business registration number
/// (`XXX-XX-XXXXX`, dashes optional) against its check digit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumRegistry;

const WEIGHTS: [u32; 9] = [1, 3, 7, 1, 3, 7, 1, 3, 5];

/// Strips dashes and whitespace; `None` unless exactly ten digits remain.
pub fn normalize_code(code: &str) -> Option<String> {
    let digits: String = code
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();
    (digits.len() == 10 && digits.chars().all(|c| c.is_ascii_digit())).then_some(digits)
}

fn checksum_ok(digits: &str) -> bool {
    let d: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if d.len() != 10 {
        return false;
    }
    let mut sum: u32 = d.iter().zip(WEIGHTS.iter()).map(|(a, w)| a * w).sum();
    sum += (d[8] * 5) / 10;
    (10 - sum % 10) % 10 == d[9]
}

#[async_trait]
impl BusinessRegistry for ChecksumRegistry {
    async fn is_valid(&self, code: &str) -> anyhow::Result<bool> {
        Ok(normalize_code(code).is_some_and(|digits| checksum_ok(&digits)))
    }
}
