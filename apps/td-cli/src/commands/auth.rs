// auth.rs - Hosted backend account: signup, signin, signout, whoami, profile.
//
// The session is saved to `<data_dir>/session.json` and picked up by every
// other command when a `[remote]` section is configured.

use std::io::BufRead;
use std::path::PathBuf;

use clap::Subcommand;
use td_remote::{AuthClient, Profile, ProfileClient, ProfileUpdate, Session, SignUp};

use crate::context::Context;

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account.
    Signup {
        #[arg(long)]
        email: String,
        /// Display name stored with the account.
        #[arg(long)]
        name: String,
        /// Password (read from stdin if omitted).
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in and save the session.
    Signin {
        #[arg(long)]
        email: String,
        /// Password (read from stdin if omitted).
        #[arg(long)]
        password: Option<String>,
    },
    /// Revoke and forget the saved session.
    Signout,
    /// Show the signed-in user.
    Whoami,
    /// Show the profile, or change it when any option is given.
    Profile {
        /// Display name.
        #[arg(long)]
        name: Option<String>,
        /// Short bio; pass "" to clear it.
        #[arg(long)]
        bio: Option<String>,
        /// Image file to upload as the avatar.
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
}

pub fn execute(cmd: &AuthCommands, ctx: &Context) -> anyhow::Result<()> {
    let (_, client) = ctx.remote()?;
    let auth = AuthClient::new(&client);
    let session_file = ctx.config.session_file();

    match cmd {
        AuthCommands::Signup {
            email,
            name,
            password,
        } => {
            let email = require("email", email)?;
            let name = require("name", name)?;
            let password = password_or_stdin(password.as_deref())?;
            match auth.sign_up(email, &password, name)? {
                SignUp::SignedIn(session) => {
                    session.save(&session_file)?;
                    println!("Account created. Signed in as {}.", email);
                }
                SignUp::ConfirmationRequired(_) => {
                    println!("Account created. Check {} for a confirmation link, then run `td auth signin`.", email);
                }
            }
        }
        AuthCommands::Signin { email, password } => {
            let email = require("email", email)?;
            let password = password_or_stdin(password.as_deref())?;
            let session = auth.sign_in(email, &password)?;
            session.save(&session_file)?;
            println!("Signed in as {}.", email);
        }
        AuthCommands::Signout => {
            if let Some(session) = Session::load(&session_file)? {
                // The local session is dropped even if the service is unreachable.
                if let Err(e) = auth.sign_out(&session) {
                    tracing::warn!("remote sign-out failed: {}", e);
                }
            }
            Session::clear(&session_file)?;
            println!("Signed out.");
        }
        AuthCommands::Whoami => {
            let user = match Session::load(&session_file)? {
                Some(session) => auth.current_user(&session)?,
                None => None,
            };
            match user {
                Some(user) => println!(
                    "{} ({})",
                    user.email.as_deref().unwrap_or("no email"),
                    user.id
                ),
                None => println!("Not signed in."),
            }
        }
        AuthCommands::Profile { name, bio, avatar } => {
            let session = ctx.session(&client)?;
            let profiles = ProfileClient::new(&client);
            let mut changes = profile_changes(name.as_deref(), bio.as_deref())?;
            if let Some(file) = avatar {
                changes.avatar_url = Some(profiles.upload_avatar(&session, file)?);
            }
            let profile = if changes.is_empty() {
                profiles.get(&session)?
            } else {
                Some(profiles.update(&session, &changes)?)
            };
            match profile {
                Some(profile) => print_profile(&profile),
                None => println!("No profile yet. Set one with `td auth profile --name <name>`."),
            }
        }
    }
    Ok(())
}

/// Names are trimmed and must not be blank; a blank bio clears it.
fn profile_changes(name: Option<&str>, bio: Option<&str>) -> anyhow::Result<ProfileUpdate> {
    Ok(ProfileUpdate {
        full_name: name.map(|n| require("name", n).map(str::to_string)).transpose()?,
        bio: bio.map(|b| b.trim().to_string()),
        avatar_url: None,
    })
}

fn print_profile(profile: &Profile) {
    let show = |v: &Option<String>| v.clone().filter(|s| !s.is_empty()).unwrap_or_else(|| "-".to_string());
    println!("Name:   {}", show(&profile.full_name));
    println!("Email:  {}", show(&profile.email));
    println!("Bio:    {}", show(&profile.bio));
    println!("Avatar: {}", show(&profile.avatar_url));
}

fn require<'a>(field: &str, value: &'a str) -> anyhow::Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        anyhow::bail!("{} must not be empty", field);
    }
    Ok(value)
}

fn password_or_stdin(password: Option<&str>) -> anyhow::Result<String> {
    let password = match password {
        Some(p) => p.to_string(),
        None => {
            eprint!("Password: ");
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_rejected() {
        assert!(require("email", "  ").is_err());
        assert_eq!(require("email", " a@b.c ").unwrap(), "a@b.c");
        assert!(password_or_stdin(Some("")).is_err());
        assert_eq!(password_or_stdin(Some("hunter22")).unwrap(), "hunter22");
    }

    #[test]
    fn auth_needs_remote_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = Context::load(dir.path());
        let err = execute(&AuthCommands::Whoami, &ctx).unwrap_err();
        assert!(err.to_string().contains("[remote]"));
    }

    #[test]
    fn profile_changes_only_carry_given_fields() {
        assert!(profile_changes(None, None).unwrap().is_empty());

        let changes = profile_changes(Some(" Sam Lee "), None).unwrap();
        assert_eq!(changes.full_name.as_deref(), Some("Sam Lee"));
        assert!(changes.bio.is_none());

        assert_eq!(profile_changes(None, Some("  ")).unwrap().bio.as_deref(), Some(""));
        let err = profile_changes(Some(" "), None).unwrap_err();
        assert!(err.to_string().contains("name must not be empty"));
    }

    #[test]
    fn profile_needs_a_session() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[remote]\nurl = \"https://example.supabase.co\"\napi_key = \"anon\"\n",
        )
        .unwrap();
        let ctx = Context::load(dir.path());
        let cmd = AuthCommands::Profile {
            name: Some("Sam".to_string()),
            bio: None,
            avatar: None,
        };
        let err = execute(&cmd, &ctx).unwrap_err();
        assert!(err.to_string().contains("td auth signin"));
    }
}
