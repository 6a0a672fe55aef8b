//! Static landing page.
//!
//! The page has no inputs and no failure paths: every render produces the
//! same document.

use common::PRODUCT_NAME;

/// Text of the page heading and `<title>`.
pub const TITLE: &str = PRODUCT_NAME;

pub const DESCRIPTION: &str = "A peer-to-peer marketplace platform for event ticket reselling. \
     Connect ticket holders with potential buyers in a trusted environment.";

pub const CARD_HEADING: &str = "Welcome to Tickets P2P";

pub const CARD_TEXT: &str = "The platform is currently in development. Stay tuned for the launch!";

const STYLES: &str = r#"
      * { box-sizing: border-box; }
      body {
        margin: 0;
        min-height: 100vh;
        font-family: ui-sans-serif, system-ui, -apple-system, "Segoe UI", Roboto, sans-serif;
        background: linear-gradient(to bottom right, #eff6ff, #e0e7ff);
      }
      .container { max-width: 1280px; margin: 0 auto; padding: 4rem 1rem; text-align: center; }
      h1 { font-size: 3rem; font-weight: 700; color: #111827; margin: 0 0 1.5rem; }
      .lead { font-size: 1.25rem; color: #4b5563; max-width: 42rem; margin: 0 auto 2rem; }
      .card {
        background: #ffffff;
        border-radius: 0.5rem;
        box-shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1), 0 2px 4px -2px rgba(0, 0, 0, 0.1);
        padding: 1.5rem;
        max-width: 28rem;
        margin: 0 auto;
      }
      .card h2 { font-size: 1.5rem; font-weight: 600; color: #1f2937; margin: 0 0 1rem; }
      .card p { color: #4b5563; margin: 0; }
"#;

/// Renders the landing page document.
pub fn render() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="{DESCRIPTION}">
    <title>{TITLE}</title>
    <style>{STYLES}    </style>
  </head>
  <body>
    <main class="container">
      <h1>{TITLE}</h1>
      <p class="lead">{DESCRIPTION}</p>
      <section class="card">
        <h2>{CARD_HEADING}</h2>
        <p>{CARD_TEXT}</p>
      </section>
    </main>
  </body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_element_holds_product_name() {
        let html = render();
        assert!(html.contains("<title>Tickets P2P</title>"));
        assert!(html.contains("<h1>Tickets P2P</h1>"));
    }

    #[test]
    fn renders_description_and_card() {
        let html = render();
        assert!(html.contains(DESCRIPTION));
        assert!(html.contains("<h2>Welcome to Tickets P2P</h2>"));
        assert!(html.contains(CARD_TEXT));
    }

    #[test]
    fn render_is_deterministic() {
        assert_eq!(render(), render());
    }
}
