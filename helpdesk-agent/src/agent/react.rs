pub const STOP_SEQUENCE: &str = "\nObservation:";

const FINAL_ANSWER: &str = "Final Answer:";
const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";

/// One parsed model turn of the Thought / Action / Observation loop.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Action { tool: String, input: String },
    Final(String),
}

fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('`', '`')] {
        if value.len() >= 2 && value.starts_with(open) && value.ends_with(close) {
            return value[1..value.len() - 1].trim();
        }
    }
    value
}

/// Parses a model turn. Anything without a usable action is an answer.
pub fn parse_step(output: &str) -> Step {
    if let Some(index) = output.rfind(FINAL_ANSWER) {
        return Step::Final(output[index + FINAL_ANSWER.len()..].trim().to_string());
    }

    if let (Some(action), Some(input)) = (output.find(ACTION), output.find(ACTION_INPUT)) {
        if action < input {
            let tool = output[action + ACTION.len()..input]
                .lines()
                .next()
                .map(|line| strip_quotes(line.trim().trim_matches(['[', ']'])).to_string())
                .unwrap_or_default();
            let raw_input = &output[input + ACTION_INPUT.len()..];
            let raw_input = raw_input.split(STOP_SEQUENCE).next().unwrap_or(raw_input);
            if !tool.is_empty() {
                return Step::Action { tool, input: strip_quotes(raw_input).to_string() };
            }
        }
    }

    let text = output.trim();
    let text = text.strip_prefix("Thought:").map(str::trim).unwrap_or(text);
    Step::Final(text.to_string())
}

/// Observation text for a tool name the agent does not carry.
pub fn unknown_tool(tool: &str, names: &[&str]) -> String {
    format!("{} is not a valid tool, try one of [{}].", tool, names.join(", "))
}

/// Running record of model turns and tool observations fed back to the model.
#[derive(Clone, Debug, Default)]
pub struct Scratchpad {
    text: String,
}

impl Scratchpad {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, model_output: &str, observation: &str) {
        self.text.push_str(model_output.trim_end());
        self.text.push_str("\nObservation: ");
        self.text.push_str(observation.trim());
        self.text.push_str("\nThought:");
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The question followed by everything recorded so far.
    pub fn question(&self, input: &str) -> String {
        if self.text.is_empty() {
            format!("Question: {}", input)
        } else {
            format!("Question: {}\n{}", input, self.text)
        }
    }
}
