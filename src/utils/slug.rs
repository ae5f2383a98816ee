use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

fn separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid slug pattern"))
}

/// Slug en minúsculas separado por guiones
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    separators()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Slug único para un post: el título más un sufijo derivado del id
pub fn post_slug(title: &str, id: Uuid) -> String {
    let base = slugify(title);
    let suffix: String = id.simple().to_string().chars().take(8).collect();
    if base.is_empty() {
        suffix
    } else {
        format!("{}-{}", base, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Toyota Yaris -- 2021!! "), "toyota-yaris-2021");
    }

    #[test]
    fn post_slug_has_id_suffix() {
        let id = Uuid::parse_str("a1b2c3d4-0000-0000-0000-000000000000").unwrap();
        assert_eq!(post_slug("Clio 5", id), "clio-5-a1b2c3d4");
        assert_eq!(post_slug("!!!", id), "a1b2c3d4");
    }
}
