//! Prompt templates for the tutoring features.
//!
//! Each request type carries the caller-supplied fields for one feature and
//! renders the full prompt sent to the model.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use study_core::model::{Difficulty, ExplanationDepth, Level};

use crate::error::TutorError;

/// Longest document excerpt sent for summarizing, in characters.
pub const SUMMARY_INPUT_LIMIT: usize = 4000;
/// Number of trailing chat messages replayed into the prompt.
pub const CHAT_HISTORY_WINDOW: usize = 6;
/// Upper bound on questions per generated quiz.
pub const MAX_GENERATED_QUESTIONS: u32 = 20;

fn require(text: &str, what: &'static str) -> Result<(), TutorError> {
    if text.trim().is_empty() {
        return Err(TutorError::InvalidRequest(what));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    pub topic: String,
    pub subject: String,
    pub difficulty: ExplanationDepth,
    pub context: Option<String>,
}

impl ExplainRequest {
    /// # Errors
    ///
    /// Returns `TutorError::InvalidRequest` if the topic or subject is blank.
    pub fn validate(&self) -> Result<(), TutorError> {
        require(&self.topic, "topic is required")?;
        require(&self.subject, "subject is required")
    }

    #[must_use]
    pub fn render(&self) -> String {
        let depth = match self.difficulty {
            ExplanationDepth::Easy => {
                "Explain this concept in simple terms with basic examples, suitable for beginners"
            }
            ExplanationDepth::Medium => {
                "Provide a detailed explanation with practical examples and some technical depth"
            }
            ExplanationDepth::Advanced => {
                "Give an in-depth, comprehensive explanation with complex examples and technical details"
            }
        };
        let context = self
            .context
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(|c| format!("Additional Context: {c}"))
            .unwrap_or_default();

        format!(
            "
You are an expert tutor for {subject}. {depth}.

Topic: {topic}
{context}

Please provide:
1. A clear explanation of the concept
2. Key points to remember
3. Practical examples
4. Common misconceptions to avoid
5. Tips for better understanding

Format your response in a structured, easy-to-read manner.
",
            subject = self.subject,
            topic = self.topic,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub subject: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_count: u32,
}

impl QuizRequest {
    /// # Errors
    ///
    /// Returns `TutorError::InvalidRequest` for a blank topic or subject, or a
    /// question count outside `1..=MAX_GENERATED_QUESTIONS`.
    pub fn validate(&self) -> Result<(), TutorError> {
        require(&self.topic, "topic is required")?;
        require(&self.subject, "subject is required")?;
        if !(1..=MAX_GENERATED_QUESTIONS).contains(&self.question_count) {
            return Err(TutorError::InvalidRequest(
                "questionCount must be between 1 and 20",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn render(&self) -> String {
        format!(
            r#"
You are a quiz generator for {subject}. Create {count} multiple-choice questions about "{topic}" at {difficulty} difficulty level.

For each question, provide:
1. A clear, specific question
2. 4 multiple choice options (A, B, C, D)
3. The correct answer (0-3 for A-D)
4. A brief explanation of why the answer is correct

Format your response as a JSON array with this exact structure:
[
  {{
    "question": "Question text here?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctAnswer": 0,
    "explanation": "Explanation of the correct answer"
  }}
]

Make sure questions test understanding, not just memorization. Include a mix of conceptual and application-based questions.
Return ONLY the JSON array, no other text.
"#,
            subject = self.subject,
            count = self.question_count,
            topic = self.topic,
            difficulty = self.difficulty.as_str(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub role: ChatRole,
    pub content: String,
}

/// One tutoring chat message with its surrounding context.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub message: String,
    pub subject: Option<String>,
    pub difficulty: Option<ExplanationDepth>,
    pub fatigue_level: Option<Level>,
    #[serde(default)]
    pub conversation_history: Vec<HistoryMessage>,
}

impl ChatTurn {
    /// # Errors
    ///
    /// Returns `TutorError::InvalidRequest` if the message is blank.
    pub fn validate(&self) -> Result<(), TutorError> {
        require(&self.message, "message is required")
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut context = Vec::new();
        if let Some(subject) = self.subject.as_deref() {
            context.push(format!("Subject: {subject}"));
        }
        if let Some(depth) = self.difficulty {
            context.push(format!("Preferred difficulty: {}", depth.as_str()));
        }
        if let Some(fatigue) = self.fatigue_level {
            context.push(format!("Current fatigue level: {}", fatigue.as_str()));
        }
        let context = if context.is_empty() {
            String::new()
        } else {
            format!("Context: {}", context.join(", "))
        };

        let skip = self
            .conversation_history
            .len()
            .saturating_sub(CHAT_HISTORY_WINDOW);
        let conversation = if self.conversation_history.is_empty() {
            String::new()
        } else {
            let lines: Vec<String> = self.conversation_history[skip..]
                .iter()
                .map(|msg| {
                    let speaker = match msg.role {
                        ChatRole::User => "Student",
                        ChatRole::Assistant => "Tutor",
                    };
                    format!("{speaker}: {}", msg.content)
                })
                .collect();
            format!("\n\nPrevious conversation:\n{}", lines.join("\n"))
        };

        let fatigue_note = if self.fatigue_level == Some(Level::High) {
            "\n\nNote: The student seems tired. Keep your response concise and encouraging. Suggest a break if appropriate."
        } else {
            ""
        };

        format!(
            "
You are an intelligent AI tutor and study companion. You help students learn effectively while being mindful of their well-being.

{context}
{conversation}
{fatigue_note}

Student's message: {message}

Respond as a helpful, encouraging tutor. Provide clear explanations, ask follow-up questions when appropriate, and adapt your teaching style to the student's needs. If the student seems confused, break down concepts into simpler parts. If they seem tired, be supportive and suggest healthy study practices.
",
            message = self.message,
        )
    }
}

/// Document text to summarize into study notes.
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
    pub subject: String,
}

impl SummarizeRequest {
    /// # Errors
    ///
    /// Returns `TutorError::InvalidRequest` if the text or subject is blank.
    pub fn validate(&self) -> Result<(), TutorError> {
        require(&self.text, "text is required")?;
        require(&self.subject, "subject is required")
    }

    #[must_use]
    pub fn render(&self) -> String {
        let excerpt: String = self.text.chars().take(SUMMARY_INPUT_LIMIT).collect();
        let ellipsis = if self.text.chars().count() > SUMMARY_INPUT_LIMIT {
            "..."
        } else {
            ""
        };

        format!(
            "
You are an AI study assistant. Analyze the following text from a {subject} document and provide:

1. A concise summary (2-3 paragraphs)
2. Key concepts and definitions (bullet points)
3. Important formulas or principles (if any)
4. 5 potential exam questions based on this content
5. Study tips for mastering this material

Text to analyze:
{excerpt} {ellipsis}

Format your response clearly with headers for each section.
",
            subject = self.subject,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSubject {
    pub name: String,
    pub difficulty: Difficulty,
    pub exam_date: Option<DateTime<Utc>>,
    pub topics: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlanRequest {
    pub subjects: Vec<PlanSubject>,
    pub daily_hours: f64,
    pub study_intensity: Level,
}

impl StudyPlanRequest {
    /// # Errors
    ///
    /// Returns `TutorError::InvalidRequest` for negative or non-finite daily hours.
    pub fn validate(&self) -> Result<(), TutorError> {
        if !self.daily_hours.is_finite() || self.daily_hours < 0.0 {
            return Err(TutorError::InvalidRequest(
                "dailyHours must be a non-negative number",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn render(&self) -> String {
        let subjects: Vec<String> = self
            .subjects
            .iter()
            .map(|s| {
                let exam = s
                    .exam_date
                    .map(|d| format!(", exam: {}", d.format("%-m/%-d/%Y")))
                    .unwrap_or_default();
                format!(
                    "{} ({} difficulty, {} topics{exam})",
                    s.name,
                    s.difficulty.as_str(),
                    s.topics
                )
            })
            .collect();

        format!(
            "
You are a study planning expert. Create a personalized study schedule based on:

Subjects:
{subjects}

Daily study time available: {hours} hours
Study intensity preference: {intensity}

Provide:
1. Priority ranking of subjects (consider difficulty and exam dates)
2. Recommended daily time allocation for each subject
3. Study sequence suggestions (which subjects to study when)
4. Break recommendations
5. Weekly review schedule
6. Tips for maintaining consistency

Consider:
- Harder subjects need more time and should be studied when energy is high
- Subjects with earlier exam dates get higher priority
- Include time for revision and practice
- Balance intensive study with lighter review sessions
",
            subjects = subjects.join("\n"),
            hours = self.daily_hours,
            intensity = self.study_intensity.as_str(),
        )
    }
}
