pub mod explore;
pub mod run;
pub mod verify;

use serde::Deserialize;

use branchwright::isa::{Context, Instruction};
use branchwright::key::Key;
use branchwright::sym::Sym;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] branchwright::error::CoreError),
}

pub type CliResult<T> = Result<T, CliError>;

/// On-disk program format: an instruction memory image plus the
/// initial bindings to seed the root `Context` with (registers,
/// memory, free variables — anything not listed reads as zero, per
/// the store's semantic floor).
#[derive(Deserialize)]
pub struct ProgramFile {
    pub instructions: Vec<(i32, Instruction)>,
    #[serde(default)]
    pub initial: Vec<(Key, Sym)>,
}

pub fn load_program(path: &std::path::Path) -> CliResult<Context> {
    let text = std::fs::read_to_string(path)?;
    let program: ProgramFile = serde_json::from_str(&text)?;
    let mut ctx = Context::new();
    for (addr, instr) in program.instructions {
        ctx.write(Key::Prog(addr), Sym::int(branchwright::isa::encode(instr) as i32));
    }
    for (key, value) in program.initial {
        ctx.write(key, value);
    }
    ctx.write(Key::Ic, Sym::zero());
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchwright::key::RegId;

    #[test]
    fn load_program_reads_instructions_and_initial_bindings_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("program.json");
        std::fs::write(
            &path,
            r#"{
                "instructions": [[0, "Halt"]],
                "initial": [[{"Reg": 0}, {"Const": {"Int32": 7}}]]
            }"#,
        )
        .unwrap();

        let ctx = load_program(&path).unwrap();
        assert_eq!(ctx.read(Key::Reg(RegId(0))), Sym::int(7));
        assert_eq!(ctx.read(Key::Ic), Sym::zero());
    }

    #[test]
    fn load_program_reports_malformed_json_as_a_cli_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load_program(&path), Err(CliError::Json(_))));
    }
}
