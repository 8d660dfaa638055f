//! DOM view of the loader. Pure function of the latest snapshot; the CSS in
//! `static/index.html` owns every visual duration.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use crate::style::{letter_styles, needs_redraw, zoom_applies};
use crate::{Step, TimelineSnapshot};

pub struct Presenter {
    document: Document,
    root: Element,
    mask: Element,
    word: Option<Element>,
    shown: Option<Step>,
}

impl Presenter {
    /// Builds the overlay skeleton inside `mount`.
    pub fn mount(document: &Document, mount: &HtmlElement) -> Result<Self, JsValue> {
        let root = document.create_element("div")?;
        root.set_class_name("loader-fullscreen");
        for half in ["loader-split-top", "loader-split-bottom"] {
            let el = document.create_element("div")?;
            el.set_class_name(half);
            root.append_child(&el)?;
        }
        let mask = document.create_element("div")?;
        mask.set_class_name("loader-text-mask");
        root.append_child(&mask)?;
        mount.append_child(&root)?;

        Ok(Self { document: document.clone(), root, mask, word: None, shown: None })
    }

    pub fn render(&mut self, snapshot: &TimelineSnapshot) -> Result<(), JsValue> {
        if snapshot.completed {
            self.root.remove();
            return Ok(());
        }

        if needs_redraw(self.shown.as_ref(), snapshot.current_step.as_ref()) {
            self.mask.set_inner_html("");
            self.word = match snapshot.current_step.as_ref() {
                Some(step) => {
                    let word = self.document.create_element("div")?;
                    word.set_class_name(if step.is_final {
                        "animated-word final-word"
                    } else {
                        "animated-word"
                    });
                    // Only indices inside the word are ever rendered.
                    for letter in letter_styles(step) {
                        let span = self.document.create_element("span")?.dyn_into::<HtmlElement>()?;
                        span.set_class_name(&format!("letter {}", letter.fill.class()));
                        span.set_text_content(Some(&letter.ch.to_string()));
                        span.style()
                            .set_property("animation-delay", &format!("{:.0}ms", letter.delay_ms))?;
                        word.append_child(&span)?;
                    }
                    self.mask.append_child(&word)?;
                    Some(word)
                }
                None => None,
            };
            self.shown = snapshot.current_step.clone();
        }

        if let Some(word) = &self.word {
            word.class_list().toggle_with_force("zoom", zoom_applies(snapshot))?;
        }
        self.root.class_list().toggle_with_force("split", snapshot.split_triggered)?;
        self.root.set_attribute(
            "aria-valuenow",
            &format!("{:.0}", snapshot.progress_percent),
        )?;
        Ok(())
    }
}
