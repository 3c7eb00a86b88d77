pub mod completion;
pub mod prompts;
pub mod tutor;

pub use completion::{CompletionConfig, CompletionProvider, OpenAiCompletionClient};
pub use prompts::{
    ChatRole, ChatTurn, ExplainRequest, HistoryMessage, PlanSubject, QuizRequest, StudyPlanRequest,
    SummarizeRequest,
};
pub use tutor::TutorService;
