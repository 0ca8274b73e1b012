pub mod auth;
pub mod documents;
pub mod domain;
pub mod ports;
pub mod training;

pub use auth::AuthService;
pub use documents::DocumentService;
pub use domain::{
    AuthenticatedUser, Document, DocumentSummary, IssuedToken, NewTrainingSample, NewUser,
    TrainingSample, User, UserCredentials,
};
pub use ports::{
    CredentialStore, DocumentStore, PasswordService, PortError, PortResult, TokenService,
    TrainingCorpusStore,
};
pub use training::TrainingCorpusService;
