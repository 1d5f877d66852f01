// Declarative commands: status, diff, apply
pub mod declarative;
