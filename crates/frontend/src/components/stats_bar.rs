use dioxus::prelude::*;
use peaceboard_shared::store::PeaceStore;

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[component]
pub fn StatsBar(store: Signal<PeaceStore>, on_sign: EventHandler<()>) -> Element {
    let (signed, countries, watching) = {
        let store = store.read();
        (store.total_pledges, store.countries_count as u64, store.active_users)
    };

    rsx! {
        div { class: "stats-bar",
            div { class: "stat",
                span { class: "stat-value", "{group_thousands(signed)}" }
                span { class: "stat-label", "signed for peace" }
            }
            div { class: "stat",
                span { class: "stat-value", "{group_thousands(countries)}" }
                span { class: "stat-label", "countries" }
            }
            div { class: "stat",
                span { class: "stat-value", "{group_thousands(watching)}" }
                span { class: "stat-label", "watching now" }
            }
            button {
                class: "sign-button",
                onclick: move |_| on_sign.call(()),
                "Sign for peace"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(100_000), "100,000");
        assert_eq!(group_thousands(83_200_000), "83,200,000");
    }
}
