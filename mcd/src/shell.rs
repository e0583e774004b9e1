use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

// The wrapper has to live in the user's shell: only the shell itself can
// change its working directory. Flags are passed straight through so help
// and version output stay visible.
const POSIX_INIT: &str = r#"mcd() {
    case "$1" in
        -h|--help|-V|--version|--init)
            command mcd "$@"
            return
            ;;
    esac
    local target
    target="$(command mcd "$@")" || return
    if [ -n "$target" ] && [ -d "$target" ]; then
        builtin cd "$target"
    fi
}
"#;

const FISH_INIT: &str = r#"function mcd
    switch "$argv[1]"
        case -h --help -V --version --init
            command mcd $argv
            return
    end
    set -l target (command mcd $argv); or return
    if test -n "$target"; and test -d "$target"
        builtin cd "$target"
    end
end
"#;

/// Shell function to `eval` from an rc file, e.g.
/// `eval "$(mcd --init bash)"`.
pub fn init_script(shell: Shell) -> &'static str {
    match shell {
        Shell::Bash | Shell::Zsh => POSIX_INIT,
        Shell::Fish => FISH_INIT,
    }
}
