use std::io::{BufRead, Write};

use serde::Serialize;
use tera::{Context, Tera};

use crate::api::client::SurveyApi;
use crate::api::error::Error;
use crate::context::store::KeyValueStore;
use crate::navigation::Navigator;
use crate::session::{SelectOutcome, SurveyPage};
use crate::view::{Feedback, FormView, View};

const FORM_TEMPLATE: &str = "\
== {{ survey.title }} ==
{% if survey.description %}{{ survey.description }}
{% endif %}{% if survey.expiresAt %}Disponível até: {{ survey.expiresAt }}
{% endif %}
{% for q in questions %}{% if q.missing %}* {% else %}  {% endif %}[{{ q.id }}] {{ q.text }}{% if q.focus %}   <- responda esta pergunta{% endif %}
{% for o in q.options %}      ({% if o.selected %}x{% else %} {% endif %}) {{ o.id }}: {{ o.text }}
{% endfor %}{% endfor %}
{% if feedback.kind == \"error\" %}Erro: {{ feedback.message }}{% if feedback.details %}
  {{ feedback.details }}{% endif %}
{% elif feedback.kind == \"success\" %}Votos registrados: {{ feedback.votes | join(sep=\", \") }}
{% endif %}{% if submitting %}Enviando votos...
{% endif %}";

const THANK_YOU_TEMPLATE: &str = "\
Obrigado! Seu voto foi registrado.
{% for r in results %}  voto #{{ r.voteId }}{% if r.sessionId %} (sessão {{ r.sessionId }}){% endif %}
{% endfor %}";

const MESSAGE_TEMPLATE: &str = "{{ title }}\n{{ message }}\n{% if details %}  {{ details }}\n{% endif %}";

pub const HELP: &str = "\
Comandos:
  <pergunta> <opção>   seleciona uma opção (também aceita <pergunta>=<opção>)
  enviar | submit      envia os votos
  ir <caminho> | go    navega para outro caminho, ex.: /surveys/3?source=qr
  recarregar | reload  recarrega a pesquisa atual
  voltar | back        volta ao formulário após o envio
  ajuda | help         mostra esta ajuda
  sair | quit          encerra";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select { question_id: u64, option_id: u64 },
    Submit,
    Go(String),
    Reload,
    Back,
    Help,
    Quit,
}

#[derive(Serialize)]
struct OptionLine<'a> {
    id: u64,
    text: &'a str,
    selected: bool,
}

#[derive(Serialize)]
struct QuestionBlock<'a> {
    id: u64,
    text: &'a str,
    missing: bool,
    focus: bool,
    options: Vec<OptionLine<'a>>,
}

/// Text renderings of each view.
pub struct Screens {
    tera: Tera,
}

impl Screens {
    pub fn new() -> Result<Self, Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("form.txt", FORM_TEMPLATE),
            ("thank_you.txt", THANK_YOU_TEMPLATE),
            ("message.txt", MESSAGE_TEMPLATE),
        ])?;
        Ok(Self { tera })
    }

    pub fn render(&self, view: &View<'_>) -> Result<String, Error> {
        let mut ctx = Context::new();
        let template = match view {
            View::Form(form) => {
                Self::form_context(form, &mut ctx);
                "form.txt"
            }
            View::ThankYou { results } => {
                ctx.insert("results", results);
                "thank_you.txt"
            }
            View::NoSurvey { message } => {
                ctx.insert("title", "Pesquisa");
                ctx.insert("message", message);
                "message.txt"
            }
            View::NotFound { message } => {
                ctx.insert("title", "Pesquisa não encontrada");
                ctx.insert("message", message);
                "message.txt"
            }
            View::Loading { .. } => {
                ctx.insert("title", "Pesquisa");
                ctx.insert("message", "Carregando...");
                "message.txt"
            }
            View::Unavailable { error } => {
                ctx.insert("title", "Pesquisa indisponível");
                ctx.insert("message", &error.message);
                ctx.insert("details", &error.details);
                "message.txt"
            }
        };
        Ok(self.tera.render(template, &ctx)?)
    }

    fn form_context(form: &FormView<'_>, ctx: &mut Context) {
        let missing: &[u64] = match &form.feedback {
            Feedback::Error { missing, .. } => *missing,
            _ => &[],
        };
        let questions = form
            .survey
            .questions
            .iter()
            .map(|q| QuestionBlock {
                id: q.id,
                text: &q.text,
                missing: missing.contains(&q.id),
                focus: form.focus == Some(q.id),
                options: q
                    .options
                    .iter()
                    .map(|o| OptionLine {
                        id: o.id,
                        text: &o.text,
                        selected: form.selections.get(&q.id) == Some(&o.id),
                    })
                    .collect(),
            })
            .collect::<Vec<_>>();

        let feedback = match &form.feedback {
            Feedback::Neutral => serde_json::json!({ "kind": "neutral" }),
            Feedback::Error { error, .. } => serde_json::json!({
                "kind": "error",
                "message": error.message,
                "details": error.details,
            }),
            Feedback::Success { results } => serde_json::json!({
                "kind": "success",
                "votes": results.iter().map(|r| format!("#{}", r.vote_id)).collect::<Vec<_>>(),
            }),
        };

        ctx.insert("survey", form.survey);
        ctx.insert("questions", &questions);
        ctx.insert("feedback", &feedback);
        ctx.insert("submitting", &form.submitting);
    }
}

pub fn parse_answer(raw: &str) -> Result<(u64, u64), String> {
    let parts = raw
        .split(|c: char| c == '=' || c == ':' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>();
    match parts.as_slice() {
        [question, option] => {
            let question_id = question
                .parse()
                .map_err(|_| format!("Pergunta inválida: '{question}'"))?;
            let option_id = option
                .parse()
                .map_err(|_| format!("Opção inválida: '{option}'"))?;
            Ok((question_id, option_id))
        }
        _ => Err(format!("Esperado <pergunta> <opção>, recebido '{raw}'")),
    }
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    let (head, rest) = trimmed
        .split_once(char::is_whitespace)
        .map(|(h, r)| (h, r.trim()))
        .unwrap_or((trimmed, ""));
    match head.to_lowercase().as_str() {
        "" => Err("Digite um comando ou 'ajuda'.".to_string()),
        "enviar" | "submit" => Ok(Command::Submit),
        "recarregar" | "reload" => Ok(Command::Reload),
        "voltar" | "back" => Ok(Command::Back),
        "ajuda" | "help" | "?" => Ok(Command::Help),
        "sair" | "quit" | "exit" => Ok(Command::Quit),
        "ir" | "go" => {
            if rest.is_empty() {
                Err("Informe o caminho, ex.: ir /surveys/3".to_string())
            } else {
                Ok(Command::Go(rest.to_string()))
            }
        }
        _ => parse_answer(trimmed).map(|(question_id, option_id)| Command::Select {
            question_id,
            option_id,
        }),
    }
}

fn describe_rejection(outcome: SelectOutcome, question_id: u64, option_id: u64) -> Option<String> {
    match outcome {
        SelectOutcome::Selected => None,
        SelectOutcome::UnknownQuestion => Some(format!("Pergunta {question_id} não existe.")),
        SelectOutcome::UnknownOption => Some(format!(
            "Opção {option_id} não existe na pergunta {question_id}."
        )),
        SelectOutcome::NoSurvey => Some("Nenhuma pesquisa carregada.".to_string()),
    }
}

/// Loads the current location, applies scripted answers and submits once.
pub async fn run_scripted<A, S, W>(
    page: &mut SurveyPage<A, S>,
    screens: &Screens,
    answers: &[(u64, u64)],
    out: &mut W,
) -> Result<bool, Error>
where
    A: SurveyApi,
    S: KeyValueStore,
    W: Write,
{
    page.sync_location().await;
    if matches!(page.view(), View::Form(_)) {
        for (question_id, option_id) in answers {
            let outcome = page.select(*question_id, *option_id);
            if let Some(msg) = describe_rejection(outcome, *question_id, *option_id) {
                writeln!(out, "{msg}")?;
            }
        }
        page.submit().await;
    }
    writeln!(out, "{}", screens.render(&page.view())?)?;
    Ok(matches!(page.view(), View::ThankYou { .. }))
}

/// Interactive loop: renders the current view, reads one command per line.
pub async fn run_interactive<A, S, R, W>(
    page: &mut SurveyPage<A, S>,
    navigator: &Navigator,
    screens: &Screens,
    input: R,
    out: &mut W,
) -> Result<(), Error>
where
    A: SurveyApi,
    S: KeyValueStore,
    R: BufRead,
    W: Write,
{
    page.sync_location().await;
    writeln!(out, "{}", screens.render(&page.view())?)?;
    writeln!(out, "{HELP}")?;

    for line in input.lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(msg) => {
                writeln!(out, "{msg}")?;
                continue;
            }
        };
        match command {
            Command::Quit => break,
            Command::Help => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            Command::Select {
                question_id,
                option_id,
            } => {
                let outcome = page.select(question_id, option_id);
                if let Some(msg) = describe_rejection(outcome, question_id, option_id) {
                    writeln!(out, "{msg}")?;
                }
            }
            Command::Submit => page.submit().await,
            Command::Go(path) => {
                navigator.navigate(&path);
                page.sync_location().await;
            }
            Command::Reload => page.follow_navigation().await,
            Command::Back => page.return_to_form(),
        }
        writeln!(out, "{}", screens.render(&page.view())?)?;
    }
    Ok(())
}
