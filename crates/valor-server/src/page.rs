use tera::{Context, Tera};

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// Render the chat page for the configured assistant.
///
/// Rendered once at startup; values are HTML-escaped by Tera.
pub fn render_index(assistant_name: &str, tagline: &str) -> Result<String, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template("index.html", INDEX_TEMPLATE)?;

    let mut context = Context::new();
    context.insert("assistant_name", assistant_name);
    context.insert("tagline", tagline);

    tera.render("index.html", &context)
}
