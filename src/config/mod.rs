mod settings;

pub use settings::{
    AnalysisSettings, AnalyzeArgs, CollectSettings, Command, Config, OutputSettings, Settings,
};
