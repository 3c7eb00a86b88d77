mod ids;
mod level;
mod profile;
mod quiz;
mod session;
mod subject;
mod topic;

pub use ids::{
    ParseIdError, ProfileId, QuizAttemptId, QuizId, StudySessionId, SubjectId, TopicId, UserId,
};
pub use level::{Difficulty, ExplanationDepth, Level, ParseLevelError};

pub use profile::{Profile, ProfileDraft, ProfileError, ProfilePatch};
pub use quiz::{
    AttemptAnswer, AttemptSubmission, GradedAttempt, OPTIONS_PER_QUESTION, Quiz, QuizAttempt,
    QuizDraft, QuizError, QuizQuestion, score_answers, validate_questions,
};
pub use session::{SessionActivityPatch, StudySession, StudySessionError, duration_minutes};
pub use subject::{Subject, SubjectDraft, SubjectError, SubjectPatch, compare_for_listing, percentage};
pub use topic::{MasteryLevel, Topic, TopicDraft, TopicError, TopicProgressPatch};
