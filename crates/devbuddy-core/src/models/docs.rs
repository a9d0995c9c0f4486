/// Built-in documentation page, opened as a read-only markdown tab.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocSection {
    pub id: &'static str,
    pub title: &'static str,
    pub content: &'static str,
}

pub const WELCOME_CONTENT: &str = "# DevBuddy IDE

Welcome to your AI-assisted development environment.

### You're connected
You now have access to your public and private repositories.

### How to use it
1. Pick a project under \"My Repositories\" in the left panel.
2. The assistant loads the file structure and is ready to help.
3. Click files to open and edit them.

### Tip
The assistant reads every file you have open. Before asking for a larger
refactoring, open the files that matter.";

pub const APP_DOCS: &[DocSection] = &[
    DocSection {
        id: "overview",
        title: "Overview",
        content: "# DevBuddy Overview

DevBuddy is a web IDE built around pair programming with an AI assistant.
Unlike a plain chat, it knows the structure of the repository you are
working on and the content of every file you have open.

## How context is built
- **Repository tree:** the first 500 paths of the connected repository.
- **Open files:** the full content of each open tab, in tab order.
- **Persona:** chosen from the language of the focused file.
",
    },
    DocSection {
        id: "auth",
        title: "Authentication Guide",
        content: "# Authentication Guide

DevBuddy talks to GitHub with a Personal Access Token.

1. Open GitHub settings, then *Developer settings*, then *Personal access tokens*.
2. Create a token with the `repo` scope to read private repositories.
3. Paste it in the login screen.

The token is stored locally under a single key and removed on logout or
when GitHub rejects it.
",
    },
    DocSection {
        id: "shortcuts",
        title: "Using the Assistant",
        content: "# Using the Assistant

- Open the files you want reviewed before asking.
- Only one question is processed at a time; wait for the answer to finish.
- *Clear chat* empties the conversation without touching your tabs.
- Switching repositories starts a fresh conversation.
",
    },
];

pub fn find_doc(id: &str) -> Option<&'static DocSection> {
    APP_DOCS.iter().find(|doc| doc.id == id)
}
