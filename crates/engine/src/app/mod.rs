mod client;
pub(crate) mod clock;
pub(crate) mod collaborators;
mod commands;
mod focus;
mod graph;
mod input;
mod input_history;
mod loop_runner;
mod pacer;
mod state;
mod tools;

pub use client::{
    Client, ClientError, LoopControl, GAME_TICK_SPEED, PREDICTION_MARGIN, UNKNOWN_VERSION,
};
pub use clock::{Clock, SystemClock};
pub use collaborators::{
    Collaborators, Editor, EditorContext, FrameTarget, Graphics, GraphicsError, Input, Sound,
    SoundError, TextRender,
};
pub use commands::{
    ClientCommand, CommandLineError, CommandParseError, CommandRegistrationError, CommandRegistry,
};
pub use focus::{FocusOutcome, FocusTracker, MouseMode, REFOCUS_SETTLE_FRAMES};
pub use graph::{GraphRect, RingGraph, GRAPH_CAPACITY};
pub use input::{Key, KeyStates};
pub use input_history::{InputHistory, InputPayload, InputSlot, INPUT_HISTORY_LEN, MAX_INPUT_SIZE};
pub use loop_runner::{run_app, AppError, LaunchOptions, WINDOW_TITLE};
pub use pacer::{FrameDecision, FramePacer, PacerSettings, BUSY_WAIT_TOLERANCE};
pub use state::{ClientState, StateMachine};
