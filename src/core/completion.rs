// src/core/completion.rs

//! Bash completion support.
//!
//! The emitted script delegates back to the program itself: on each tab
//! press the shell invokes `<prog> --bash-completion <words...>`, and the
//! dispatcher answers with the candidate list for the deepest resolvable
//! node. Install with:
//!
//! ```text
//! my-tool --bash-completion-script > /etc/bash_completion.d/my-tool
//! ```

/// Renders the completion function for `prog`.
pub(crate) fn completion_script(prog: &str) -> String {
    format!(
        "_{prog}() {{\n\
         \x20\x20local cur=\"${{COMP_WORDS[COMP_CWORD]}}\"\n\
         \x20\x20local list=$({prog} --bash-completion $COMP_LINE)\n\
         \x20\x20COMPREPLY=($(compgen -W \"$list\" $cur))\n\
         }}\n\
         complete -F _{prog} {prog}\n"
    )
}
