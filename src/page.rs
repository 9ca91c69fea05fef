use include_dir::{include_dir, Dir};
use minijinja::{context, Environment};

use crate::session::SessionState;

static TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for file in TEMPLATES.files() {
            let (Some(name), Some(source)) = (file.path().to_str(), file.contents_utf8()) else {
                continue;
            };
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render_index(&self, session: &SessionState) -> Result<String, minijinja::Error> {
        self.env.get_template("index.html")?.render(context! {
            api_key_set => session.api_key().is_ok(),
            current_image_url => &session.current_image_url,
            generated_images => &session.generated_images,
            original_prompt => &session.original_prompt,
            enhanced_prompt => &session.enhanced_prompt,
        })
    }
}
