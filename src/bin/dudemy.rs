//! Dudemy CLI — course publishing against an in-process storage node
//!
//! Commands:
//!   dudemy demo     — register, publish a course and a lesson, play it back
//!   dudemy protocol — print the course protocol definition as JSON
//!   dudemy config   — write the default configuration to a file

use dudemy_core::{
    dudemy_protocol, Command, CommandOutput, DidResolver, IdentityAgent, InMemoryNode, KeyStore,
    NodeNetwork, Platform, PlatformConfig, PublishPolicy, SessionCache,
};
use std::env;
use std::sync::Arc;

const KEYS_FILE: &str = "dudemy-keys.json";
const NODE_FILE: &str = "dudemy-node.json";
const CONFIG_FILE: &str = "dudemy.json";

fn print_usage() {
    println!(
        r#"
Dudemy — DID-addressed course publishing

Usage: dudemy <command> [options]

Commands:
  demo     [config.json]     Run the full flow against a local node
  protocol                   Print the course protocol definition
  config   [path]            Write the default configuration
"#
    );
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "demo" => cmd_demo(&args[2..]).await,
        "protocol" => cmd_protocol(),
        "config" => cmd_config(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
        }
    }
}

fn cmd_protocol() {
    match serde_json::to_string_pretty(&dudemy_protocol()) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("  Failed to encode protocol: {}", e),
    }
}

fn cmd_config(args: &[String]) {
    let path = args.first().map(String::as_str).unwrap_or(CONFIG_FILE);
    match PlatformConfig::default().save(path) {
        Ok(()) => println!("  Wrote default configuration to {}", path),
        Err(e) => eprintln!("  Failed to write {}: {}", path, e),
    }
}

/// Key store and node snapshot from the working directory, or fresh ones
async fn open_workspace(resolver: Arc<DidResolver>) -> Result<(IdentityAgent, Arc<InMemoryNode>), String> {
    let mut keys = KeyStore::open(KEYS_FILE).map_err(|e| e.to_string())?;
    if keys.dids().next().is_none() {
        keys.generate();
        keys.save(KEYS_FILE).map_err(|e| e.to_string())?;
        println!("  Created identity, keys saved to {}", KEYS_FILE);
    }
    let mut agent = IdentityAgent::with_keys(keys, resolver.clone());
    let did = agent.connect();

    let network = NodeNetwork::new(resolver);
    let node = InMemoryNode::open(NODE_FILE, did, network.clone())
        .await
        .map_err(|e| e.to_string())?;
    network.publish(&node).await;
    Ok((agent, node))
}

/// First eight characters of a record id, or the whole id if shorter
fn short_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(end, _)| &id[..end])
}

async fn run(platform: &mut Platform<InMemoryNode>, command: Command) -> Option<CommandOutput> {
    match platform.execute(command).await {
        Ok(output) => Some(output),
        Err(e) => {
            eprintln!("  Error: {}", e);
            None
        }
    }
}

async fn cmd_demo(args: &[String]) {
    println!("\n  Dudemy demo");
    println!("{}", "-".repeat(60));

    let config = match args.first() {
        Some(path) => PlatformConfig::load_or_default(path),
        None => PlatformConfig::default(),
    };

    let resolver = Arc::new(DidResolver::new());
    let (agent, node) = match open_workspace(resolver).await {
        Ok(workspace) => workspace,
        Err(e) => {
            eprintln!("  Failed to open workspace: {}", e);
            return;
        }
    };

    let mut platform = match Platform::init(agent, node.clone(), SessionCache::new(), config).await {
        Ok(platform) => platform,
        Err(e) => {
            eprintln!("  Initialisation failed: {}", e);
            return;
        }
    };
    println!("  DID: {}", platform.did());

    // Step 1: credential
    if platform.config().require_instructor && !platform.session().is_logged_in() {
        println!("\nStep 1: Registering instructor credential...");
        let command = Command::Register {
            name: "Alice".into(),
            email: "alice@example.com".into(),
        };
        if run(&mut platform, command).await.is_none() {
            return;
        }
    } else {
        println!("\nStep 1: Session restored or credential not required");
    }
    if let Some(credential) = platform.session().credential() {
        println!(
            "  Logged in as {} <{}> ({})",
            credential.claims().name,
            credential.claims().email,
            credential.claims().role
        );
    }

    // Step 2: course
    println!("\nStep 2: Publishing a course...");
    let command = Command::CreateCourse {
        title: "Intro to DIDs".into(),
        description: "Decentralized identifiers from first principles".into(),
        author: "Alice".into(),
    };
    let Some(CommandOutput::CourseCreated(course_id)) = run(&mut platform, command).await else {
        return;
    };
    println!("  Course: {}", course_id);

    // Step 3: lesson with video
    println!("\nStep 3: Uploading a lesson...");
    let command = Command::UploadLesson {
        course_id: course_id.clone(),
        title: "Lesson 1".into(),
        video: b"\x00\x00\x00\x18ftypmp42demo".to_vec(),
        publish: PublishPolicy::Immediate,
    };
    let Some(CommandOutput::LessonCreated(lesson)) = run(&mut platform, command).await else {
        return;
    };
    println!("  Lesson {} -> video {}", lesson.id, lesson.video_id);

    // Step 4: browse
    println!("\nStep 4: Browsing...");
    if let Some(CommandOutput::Courses(courses)) = run(&mut platform, Command::ListCourses).await {
        for course in &courses {
            println!("  [{}] {} - {}", short_id(&course.id), course.title, course.description);
        }
    }
    let command = Command::SelectCourse {
        course_id: course_id.clone(),
    };
    if let Some(CommandOutput::Lessons(lessons)) = run(&mut platform, command).await {
        for lesson in lessons {
            let command = Command::ResolveVideo {
                video_id: lesson.video_id.clone(),
            };
            if let Some(CommandOutput::Video(Some(playable))) = run(&mut platform, command).await {
                println!(
                    "  {} -> {} ({}, {} bytes)",
                    lesson.lesson_title, playable.url, playable.mime_type, playable.size
                );
                run(&mut platform, Command::ReleaseVideo { url: playable.url }).await;
            }
        }
    }

    // Step 5: comments
    println!("\nStep 5: Comments...");
    let command = Command::AddComment {
        course_id: course_id.clone(),
        author: "Bob".into(),
        text: "Great first lesson".into(),
    };
    run(&mut platform, command).await;
    if let Some(CommandOutput::Comments(comments)) =
        run(&mut platform, Command::ListComments { course_id }).await
    {
        for comment in comments {
            println!("  {}: {}", comment.author, comment.text);
        }
    }

    match node.save(NODE_FILE).await {
        Ok(()) => println!("\n  Saved node to {}", NODE_FILE),
        Err(e) => eprintln!("\n  Failed to save node: {}", e),
    }
}
