use sinkdns_proto::QueryType;

/// FNV-1a 32-bit hash of `name` joined with a family suffix, matching the
/// key derivation the in-memory cache this crate replaces used
/// (`computeName`/`hash` over `name + "_v4"`/`"_v6"`). A 32-bit hash keeps
/// entries small and collisions are an acceptable risk for a best-effort
/// cache: a collision just means one of the two names misses early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u32);

const FNV_OFFSET_BASIS: u32 = 0x811c9dc5;
const FNV_PRIME: u32 = 0x01000193;

fn fnv1a(input: &str) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in input.as_bytes() {
        hash ^= *byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

impl CacheKey {
    pub fn new(name: &str, qtype: QueryType) -> Self {
        let suffix = match qtype {
            QueryType::A => "_v4",
            QueryType::AAAA => "_v6",
        };
        let mut composed = name.to_lowercase();
        composed.push_str(suffix);
        CacheKey(fnv1a(&composed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_different_family_gives_different_keys() {
        let v4 = CacheKey::new("example.com", QueryType::A);
        let v6 = CacheKey::new("example.com", QueryType::AAAA);
        assert_ne!(v4, v6);
    }

    #[test]
    fn is_case_insensitive() {
        assert_eq!(
            CacheKey::new("Example.COM", QueryType::A),
            CacheKey::new("example.com", QueryType::A)
        );
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(
            CacheKey::new("example.com", QueryType::A),
            CacheKey::new("example.com", QueryType::A)
        );
    }
}
