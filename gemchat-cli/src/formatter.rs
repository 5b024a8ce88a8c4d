use chrono::{Local, TimeZone};
use gemchat_core::chat::{ChatMessage, MessageBody, MessageSender, Recipe};
use gemchat_core::voice::tts::Voice;

#[derive(Clone)]
pub struct Formatter {
    use_colors: bool,
}

impl Formatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn prompt(&self) -> String {
        format!("{} ", self.paint("35", ">"))
    }

    pub fn print_system(&self, msg: &str) {
        println!("{} {msg}", self.paint("33", "[System]"));
    }

    pub fn print_error(&self, msg: &str) {
        eprintln!("{} {msg}", self.paint("31", "[Error]"));
    }

    pub fn print_typing(&self) {
        println!("{}", self.paint("90", "Gemini is typing..."));
    }

    pub fn print_message(&self, message: &ChatMessage) {
        match (&message.sender, &message.body) {
            (MessageSender::User, body) => self.print_user(body),
            (MessageSender::Model, MessageBody::Recipe(recipe)) => self.print_recipe(recipe),
            (MessageSender::Model, body) => {
                let text = match body {
                    MessageBody::Text(text) | MessageBody::Image { text, .. } => text.as_str(),
                    MessageBody::Recipe(_) => "",
                };
                println!("{} {text}", self.paint("32", "[Gemini]"));
            }
        }
    }

    fn print_user(&self, body: &MessageBody) {
        let label = self.paint("34", "[You]");
        match body {
            MessageBody::Text(text) => println!("{label} {text}"),
            MessageBody::Image { text, image } => {
                let source = image.source.as_deref().unwrap_or(&image.mime_type);
                println!("{label} {text} {}", self.paint("90", &format!("[image: {source}]")));
            }
            MessageBody::Recipe(recipe) => println!("{label} {}", recipe.recipe_name),
        }
    }

    /// Renders a recipe as a card: name, bulleted ingredients and numbered
    /// steps.
    pub fn print_recipe(&self, recipe: &Recipe) {
        println!("{}", self.paint("1;32", &recipe.recipe_name));
        println!("{}", self.paint("1", "Ingredients:"));
        for item in &recipe.ingredients {
            println!("  • {item}");
        }
        println!("{}", self.paint("1", "Instructions:"));
        for (i, step) in recipe.instructions.iter().enumerate() {
            println!("  {}. {step}", i + 1);
        }
    }

    /// One line per message, prefixed with the index `/listen` accepts.
    pub fn print_history(&self, messages: &[ChatMessage]) {
        for (index, message) in messages.iter().enumerate() {
            let time = Local
                .timestamp_millis_opt(message.timestamp as i64)
                .single()
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default();
            let who = match message.sender {
                MessageSender::User => "You",
                MessageSender::Model => "Gemini",
            };
            let summary = match &message.body {
                MessageBody::Text(text) => text.clone(),
                MessageBody::Image { text, .. } => format!("{text} [image]"),
                MessageBody::Recipe(recipe) => format!("[recipe] {}", recipe.recipe_name),
            };
            println!(
                "{} {} {who}: {summary}",
                self.paint("90", &format!("[{index}]")),
                self.paint("90", &time)
            );
        }
    }

    pub fn print_voices(&self, voices: &[Voice]) {
        for voice in voices {
            println!("  {} {}", self.paint("36", &voice.id), voice.name);
        }
    }
}
