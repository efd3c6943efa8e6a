//! Buddy chat window

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlButtonElement, HtmlElement, HtmlFormElement, HtmlInputElement};

use super::Page;
use crate::chat::{self, Conversation, Role};
use crate::platform::{Timeout, dom};

struct ChatWindow {
    form: HtmlFormElement,
    input: HtmlInputElement,
    log: HtmlElement,
    conversation: Conversation,
    reply_timer: Option<Timeout>,
}

impl ChatWindow {
    fn append(&self, document: &web_sys::Document, role: Role, content: &str) -> Result<(), JsValue> {
        let line = document.create_element("p")?;
        line.set_class_name(role.line_class());

        let name = document.create_element("span")?;
        name.set_class_name("aim-name");
        name.set_text_content(Some(role.speaker()));
        let text = document.create_element("span")?;
        text.set_class_name("aim-text");
        text.set_text_content(Some(content));

        line.append_child(&name)?;
        line.append_child(&text)?;
        self.log.append_child(&line)?;
        self.log.set_scroll_top(self.log.scroll_height());
        Ok(())
    }

    fn set_pending(&self, pending: bool) {
        self.input.set_disabled(pending);
        let submit = self
            .form
            .query_selector("button[type=\"submit\"]")
            .ok()
            .flatten()
            .and_then(|el: Element| el.dyn_into::<HtmlButtonElement>().ok());
        if let Some(submit) = submit {
            submit.set_disabled(pending);
            submit.set_text_content(Some(if pending { "..." } else { "Send" }));
        }
    }
}

type SharedChat = Rc<RefCell<ChatWindow>>;

pub fn init_chat(page: &Rc<Page>) -> Result<(), JsValue> {
    let form = dom::by_id(&page.document, "aimChatForm").and_then(|el| el.dyn_into::<HtmlFormElement>().ok());
    let input = dom::by_id(&page.document, "aimChatInput").and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
    let log_el = dom::by_id(&page.document, "aimChatLog").and_then(|el| el.dyn_into::<HtmlElement>().ok());
    let (Some(form), Some(input), Some(log_el)) = (form, input, log_el) else {
        return Ok(());
    };

    let window = Rc::new(RefCell::new(ChatWindow {
        form: form.clone(),
        input,
        log: log_el,
        conversation: Conversation::new(),
        reply_timer: None,
    }));

    let submit_page = Rc::clone(page);
    dom::listen(&form, "submit", move |event: web_sys::Event| {
        event.prevent_default();
        submit(&submit_page, &window);
    })
}

fn submit(page: &Rc<Page>, window: &SharedChat) {
    let snapshot = {
        let mut state = window.borrow_mut();
        let text = state.input.value();
        let Some(message) = state.conversation.push_user(&text).cloned() else {
            return;
        };
        if let Err(err) = state.append(&page.document, Role::User, &message.content) {
            log::warn!("Chat line not shown: {:?}", err);
        }
        state.input.set_value("");
        state.set_pending(true);
        state.conversation.clone()
    };

    let endpoint = page.settings.chat_endpoint.clone();
    let page = Rc::clone(page);
    let window = Rc::clone(window);
    spawn_local(async move {
        let reply = match chat::send(&endpoint, &snapshot).await {
            Ok(reply) => reply,
            Err(err) => err.to_string(),
        };
        let delay = page.with_rng(|rng| chat::reply_delay_ms(&reply, rng));

        let deliver_page = Rc::clone(&page);
        let deliver_window = Rc::clone(&window);
        let late = reply.clone();
        match page.timeout(delay, move || deliver(&deliver_page, &deliver_window, late)) {
            Some(timer) => window.borrow_mut().reply_timer = Some(timer),
            None => deliver(&page, &window, reply),
        }
    });
}

fn deliver(page: &Page, window: &SharedChat, reply: String) {
    let mut state = window.borrow_mut();
    state.reply_timer = None;
    if let Err(err) = state.append(&page.document, Role::Assistant, &reply) {
        log::warn!("Chat line not shown: {:?}", err);
    }
    state.conversation.push_assistant(reply);
    state.set_pending(false);
    let _ = state.input.focus();
}
