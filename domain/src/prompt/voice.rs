//! Voice-oriented query formatting

/// Templates for turning a spoken query into the first user message
pub struct VoicePromptTemplate;

impl VoicePromptTemplate {
    /// Instructions appended after the listener's query
    pub fn voice_instructions() -> &'static str {
        "Please use the available cryptocurrency tools to get the data you need, \
then provide a complete, conversational response suitable for voice. \
Make your response short and concise, and if the answer involves a list, \
rewrite it in paragraph format so it can be read aloud naturally."
    }

    /// The first user message for a query
    pub fn format_query(raw_query: &str) -> String {
        format!("{}\n\n{}", raw_query, Self::voice_instructions())
    }
}
