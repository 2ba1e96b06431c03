use bcrypt::Version;
use rand::Rng;
use rand::seq::SliceRandom;

/// Coût BCrypt des hash stockés
const BCRYPT_COST: u32 = 10;

/// Hash un mot de passe en BCrypt (`$2a$10$...`)
pub fn hash_password(password: &str) -> Result<String, String> {
    bcrypt::hash_with_result(password, BCRYPT_COST)
        .map(|parts| parts.format_for_version(Version::TwoA))
        .map_err(|e| format!("Password hashing failed: {}", e))
}

/// Vérifie un mot de passe contre un hash BCrypt ($2a$, $2b$ ou $2y$)
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, String> {
    bcrypt::verify(password, stored_hash)
        .map_err(|e| format!("Password verification failed: {}", e))
}

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SPECIAL: &[u8] = b"!@#$%^&*";
const GENERATED_LENGTH: usize = 12;

/// Génère un mot de passe temporaire de 12 caractères
/// Contient au moins une majuscule, une minuscule, un chiffre et un caractère spécial
pub fn generate_random_password() -> String {
    let mut rng = rand::thread_rng();
    let all: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS, SPECIAL].concat();

    let mut chars: Vec<u8> = Vec::with_capacity(GENERATED_LENGTH);
    for set in [UPPERCASE, LOWERCASE, DIGITS, SPECIAL] {
        chars.push(set[rng.gen_range(0..set.len())]);
    }
    while chars.len() < GENERATED_LENGTH {
        chars.push(all[rng.gen_range(0..all.len())]);
    }

    chars.shuffle(&mut rng);
    chars.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("S3cret!pass").unwrap();
        assert!(hash.starts_with("$2a$10$"));
        assert_eq!(hash.len(), 60);
        assert!(verify_password("S3cret!pass", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_verify_existing_2a_hash() {
        let stored = "$2a$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";
        assert!(verify_password("password", stored).unwrap());
        assert!(!verify_password("Password", stored).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(verify_password("x", "not-a-hash").is_err());
        assert!(verify_password("x", "pbkdf2:sha256:260000$abc$def").is_err());
    }

    #[test]
    fn test_generated_password_composition() {
        for _ in 0..50 {
            let password = generate_random_password();
            assert_eq!(password.len(), 12);
            assert!(password.bytes().any(|c| UPPERCASE.contains(&c)));
            assert!(password.bytes().any(|c| LOWERCASE.contains(&c)));
            assert!(password.bytes().any(|c| DIGITS.contains(&c)));
            assert!(password.bytes().any(|c| SPECIAL.contains(&c)));
        }
    }
}
