use super::state::StageName;

pub struct StageDefinition {
    pub name: StageName,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Simulated duration before jitter and time scaling.
    pub base_duration_ms: u64,
}

pub static STAGES: &[StageDefinition] = &[
    StageDefinition {
        name: StageName::Validate,
        display_name: "Validate",
        description: "Check deployment configuration and prerequisites",
        base_duration_ms: 500,
    },
    StageDefinition {
        name: StageName::Build,
        display_name: "Build",
        description: "Compile and package release artifacts",
        base_duration_ms: 2000,
    },
    StageDefinition {
        name: StageName::Test,
        display_name: "Test",
        description: "Run the automated test suites against the build",
        base_duration_ms: 1500,
    },
    StageDefinition {
        name: StageName::Deploy,
        display_name: "Deploy",
        description: "Roll the release out to the target environment",
        base_duration_ms: 1000,
    },
    StageDefinition {
        name: StageName::Monitor,
        display_name: "Monitor",
        description: "Watch post-release health signals",
        base_duration_ms: 800,
    },
];

pub fn stage_definition(name: StageName) -> &'static StageDefinition {
    STAGES
        .iter()
        .find(|s| s.name == name)
        .unwrap_or(&STAGES[0])
}
