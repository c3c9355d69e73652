//! Constrained template substitution for pad duplication
//!
//! Duplicating a template pad renders four named placeholders - `{date}`,
//! `{name}`, `{password}`, `{slug}` - and nothing else. This is a deliberate
//! narrowing: the fixed vocabulary covers every template in use without
//! pulling a template engine into the crate.
//!
//! Rendering is two-phase (see [`crate::lifecycle`]): the password, name,
//! and slug templates are rendered first against a date-only context, then
//! their outputs feed the body render, so a body may embed the freshly
//! generated password or slug.
//!
//! A brace sequence that is not one of the four placeholders is left
//! verbatim; markdown bodies are full of braces with other meanings.

/// Values available to a render pass. Placeholders for empty fields render
/// as the empty string, matching a parameter template that references a
/// value not yet generated.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub date: String,
    pub name: String,
    pub password: String,
    pub slug: String,
}

impl TemplateContext {
    /// Phase-one context: only the timestamp is known.
    pub fn with_date(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        match key {
            "date" => Some(&self.date),
            "name" => Some(&self.name),
            "password" => Some(&self.password),
            "slug" => Some(&self.slug),
            _ => None,
        }
    }
}

/// Substitute the known placeholders in `template`.
pub fn render(template: &str, ctx: &TemplateContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match ctx.lookup(key) {
                    Some(value) => {
                        out.push_str(value);
                        rest = &after[close + 1..];
                    }
                    None => {
                        // not ours; emit the brace and rescan from inside it
                        out.push('{');
                        rest = after;
                    }
                }
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
