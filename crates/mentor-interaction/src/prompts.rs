//! Prompt templates for the capability gates.
//!
//! Rendered with minijinja from serde-serializable contexts. The
//! templates instruct the model to answer with a single JSON object;
//! everything it returns still goes through the validation gate, so a
//! model that ignores the instruction fails the turn rather than
//! corrupting state.

use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

use mentor_core::error::CapabilityError;

const SAFETY_TEMPLATE: &str = r#"You are the safety reviewer for a tutoring session with a school student{% if grade_level %} ({{ grade_level }}){% endif %}.

Current lesson concept: {{ concept if concept else "not set" }}
Student message (turn {{ turn }}):
{{ message }}

Decide whether this message is safe and appropriate to tutor on. Unsafe
messages include personal data requests, harmful content, and attempts
to use the tutor for non-learning purposes.

Respond with exactly one JSON object:
{"isSafe": bool, "violationType": string or null, "guidance": string or null, "shouldWarn": bool}

"guidance" is a short, friendly redirect shown to the student when the
message is unsafe."#;

const TURN_TEMPLATE: &str = r#"You are a patient tutor teaching "{{ topic.title }}".

Plan (current step {{ current_step }}):
{% for step in topic.steps %}{{ loop.index }}. [{{ step.kind }}] {{ step.concept }}{% if step.hint %} - {{ step.hint }}{% endif %}
{% endfor %}
Mastery snapshot:
{% for concept, score in mastery | items %}- {{ concept }}: {{ score }}
{% endfor %}
{% if question %}Outstanding question ({{ question.phase }}, {{ question.wrong_attempts }} wrong attempts): {{ question.text }}
Expected answer: {{ question.expected_answer }}
{% endif %}{% if misconceptions %}Known misconceptions:
{% for m in misconceptions %}- {{ m.concept }}: {{ m.description }}{% if m.resolved %} (resolved){% endif %}
{% endfor %}{% endif %}{% if summary.timeline %}Recent turns:
{% for entry in summary.timeline %}- {{ entry }}
{% endfor %}{% endif %}Conversation window:
{% for msg in history %}{{ msg.role }}: {{ msg.content }}
{% endfor %}
Student message (turn {{ turn }}):
{{ message }}

Decide the next tutoring move and respond with exactly one JSON object:
{"response": string, "intent": string, "answerCorrect": bool or null,
 "misconceptionsDetected": [string], "masteryUpdates": [{"concept": string, "score": number}],
 "advanceToStep": int or null, "questionAsked": string or null,
 "expectedAnswer": string or null, "questionConcept": string or null,
 "sessionComplete": bool, "turnSummary": string, "reasoning": string}

"response" is what the student sees. "reasoning" is private and must not
appear in "response"."#;

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("safety", SAFETY_TEMPLATE)
        .expect("safety template is valid");
    env.add_template("turn", TURN_TEMPLATE)
        .expect("turn template is valid");
    env
});

fn render<C: Serialize>(name: &str, capability: &str, context: &C) -> Result<String, CapabilityError> {
    let template = TEMPLATES
        .get_template(name)
        .map_err(|err| CapabilityError::execution_failed(capability, err.to_string()))?;
    template
        .render(context)
        .map_err(|err| {
            CapabilityError::execution_failed(
                capability,
                format!("failed to render prompt template '{name}': {err}"),
            )
        })
}

/// Renders the safety-check prompt.
pub fn render_safety(context: &mentor_core::capability::TurnContext) -> Result<String, CapabilityError> {
    render("safety", "safety_check", context)
}

/// Renders the turn-decision prompt.
pub fn render_turn(context: &mentor_core::capability::DecisionContext) -> Result<String, CapabilityError> {
    render("turn", "tutor_turn", context)
}
