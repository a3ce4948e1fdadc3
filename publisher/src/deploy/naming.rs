//! Repository naming and framework detection

use crate::models::provider::Framework;

/// Derive a URL-safe repository name from a project name
///
/// Lower-cases the name and replaces every character outside `[a-z0-9-]`
/// with `-`. Names that differ only in case or in disallowed characters
/// map to the same slug; collisions are left to the provider to reject.
pub fn sanitize_repository_name(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Map a template key to the hosting provider's framework preset
pub fn detect_framework(template_key: &str) -> Framework {
    let key = template_key.trim().to_ascii_lowercase();

    if key.starts_with("next") {
        Framework::NextJs
    } else if key.starts_with("nuxt") {
        Framework::Nuxt
    } else if key == "react" || key.starts_with("vite") || key.starts_with("react-") {
        Framework::Vite
    } else if key.starts_with("vue") {
        Framework::Vue
    } else if key.starts_with("svelte") {
        Framework::SvelteKit
    } else if key.starts_with("astro") {
        Framework::Astro
    } else if key.starts_with("angular") {
        Framework::Angular
    } else {
        Framework::Other
    }
}
