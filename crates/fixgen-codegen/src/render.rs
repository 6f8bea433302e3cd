use fixgen_types::FixtureDefinition;
use sha2::{Digest, Sha256};

/// Deterministic listing of a module: one entry per definition.
pub fn render_listing(model_name: &str, defs: &[FixtureDefinition]) -> String {
    let mut out = format!("# fixtures generated for {model_name}\n");
    for def in defs {
        let args = std::iter::once("request")
            .chain(def.deps.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "\n{name}({args})\n    handler: {handler}\n    params: {params}\n",
            name = def.name,
            handler = def.kind.handler_name(),
            params = def.params_key(),
        ));
        if !def.related.is_empty() {
            out.push_str(&format!("    related: {}\n", def.related.join(", ")));
        }
    }
    out
}

pub fn fingerprint(listing: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(listing.as_bytes());
    hex::encode(hasher.finalize())
}
