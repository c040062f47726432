pub mod feed;
pub mod workout;

pub use feed::{ConversationRecord, LogRecord, LogStatus, ReceivedDataRecord};
pub use workout::{
    ExercisePatch, NewExercise, SessionWithExercises, SubmissionReceipt, WorkoutExercise,
    WorkoutSession, WorkoutSubmission,
};
