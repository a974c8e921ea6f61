//! Counter-argument generation

use rebut_core::{DebateMode, Evidence, Round};
use rebut_llm::{LlmProvider, LlmRequest};
use std::sync::Arc;

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::invoke::complete_text;
use crate::prompt::{render_evidence, render_history};

const NORMAL_SYSTEM: &str = "You are a skilled debater taking the opposing position.";
const ROAST_SYSTEM: &str = "You are a witty but respectful debate opponent in ROAST MODE.";

/// Inputs for one counter-argument
#[derive(Debug, Clone)]
pub struct ArgumentRequest<'a> {
    pub topic: &'a str,
    /// The user's detected position
    pub user_position: &'a str,
    pub user_argument: &'a str,
    pub evidence: &'a [Evidence],
    pub mode: DebateMode,
    pub round_number: u32,
    /// Rounds appended so far, oldest first
    pub history: &'a [Round],
}

/// Writes the AI's counter-argument as plain text
#[derive(Debug, Clone)]
pub struct ArgumentGenerator {
    llm: Arc<dyn LlmProvider>,
    config: AgentConfig,
}

impl ArgumentGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        Self { llm, config }
    }

    /// Build the generation prompt for the requested mode
    pub fn prompt(&self, req: &ArgumentRequest<'_>) -> String {
        let history = render_history(req.history, self.config.history_window);
        let evidence = render_evidence(req.evidence);

        match req.mode {
            DebateMode::Roast => format!(
                r#"Topic: {}
User's Position: {}
User's Latest Argument: {}
Round: {}
{}
{}

Create a counter-argument that:
1. Is playfully sarcastic but NEVER rude or offensive
2. Points out flaws with clever humor
3. Uses evidence to support your points
4. Stays respectful and fun
5. Is 150-250 words

Example tone: "Oh, interesting point! Though I must say, claiming [X] while ignoring [Y] is quite the creative interpretation of reality..."

Generate your counter-argument (NO JSON, just the argument text):"#,
                req.topic, req.user_position, req.user_argument, req.round_number, history, evidence
            ),
            DebateMode::Normal => format!(
                r#"Topic: {}
User's Position: {}
User's Latest Argument: {}
Round: {}
{}
{}

Create a strong counter-argument that:
1. Directly addresses the user's points
2. Uses evidence from sources provided
3. Presents logical reasoning
4. Acknowledges valid points but shows flaws
5. Introduces new perspectives
6. Is respectful and constructive
7. Is 100-150 words

Generate your counter-argument (NO JSON, just the argument text):"#,
                req.topic, req.user_position, req.user_argument, req.round_number, history, evidence
            ),
        }
    }

    /// Generate the counter-argument. Transport failures and timeouts propagate.
    pub async fn generate(&self, req: &ArgumentRequest<'_>) -> Result<String, AgentError> {
        let system = match req.mode {
            DebateMode::Roast => ROAST_SYSTEM,
            DebateMode::Normal => NORMAL_SYSTEM,
        };
        let request = LlmRequest::with_role(system, &self.prompt(req))
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens);

        let text = complete_text(self.llm.as_ref(), request, self.config.timeout).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}
