use leptos::ev::{Event, MouseEvent};
use leptos::prelude::*;

use crate::components::flow_canvas::{FlowCanvas, FlowStatus};
use crate::flow::catalog::NodeSpec;
use crate::flow::{Catalog, UserAction};

const ALL_NODES: &str = "all";

/// First line of a multi-line label, for compact pickers.
fn short_label(spec: &NodeSpec) -> String {
	spec.label.lines().next().unwrap_or_default().to_owned()
}

fn node_options(nodes: &[NodeSpec]) -> impl IntoView + use<> {
	nodes
		.iter()
		.map(|n| view! { <option value=n.id.clone()>{short_label(n)}</option> })
		.collect_view()
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let nodes = Catalog::builtin().map(|c| c.nodes).unwrap_or_default();
	let first = nodes.first().map(|n| n.id.clone()).unwrap_or_default();
	let second = nodes.get(1).map(|n| n.id.clone()).unwrap_or_default();

	let commands = RwSignal::new(Vec::<UserAction>::new());
	let status = RwSignal::new(FlowStatus::default());
	let send = move |action: UserAction| commands.update(|queue| queue.push(action));

	let source = RwSignal::new(first);
	let target = RwSignal::new(second);
	let rate = RwSignal::new(1u32);
	let scale_target = RwSignal::new(ALL_NODES.to_owned());

	let add_flow = move |_: MouseEvent| {
		send(UserAction::AddEdge {
			source: source.get_untracked(),
			target: target.get_untracked(),
			rate: rate.get_untracked(),
		})
	};
	let remove_flow = move |_: MouseEvent| {
		send(UserAction::RemoveEdge {
			source: source.get_untracked(),
			target: target.get_untracked(),
		})
	};
	let toggle_simulation = move |_: MouseEvent| {
		if status.get_untracked().simulation.is_running() {
			send(UserAction::StopSimulation);
		} else {
			send(UserAction::StartSimulation);
		}
	};
	let rescale = move |ev: Event| {
		let Ok(factor) = event_target_value(&ev).parse::<f64>() else {
			return;
		};
		let node = scale_target.get_untracked();
		send(UserAction::ScaleNodes {
			node: (node != ALL_NODES).then_some(node),
			factor,
		});
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<FlowCanvas commands=commands status=status fullscreen=true />
				<div class="graph-overlay">
					<h1>"Flow Bubbles"</h1>
					<p class="subtitle">"Drag circles to reposition. Click one to emphasise it."</p>

					<div class="controls">
						<button on:click=move |_| send(UserAction::ToggleAnimation)>
							{move || if status.get().animating { "Stop Animation" } else { "Start Animation" }}
						</button>
						<button on:click=toggle_simulation>
							{move || {
								if status.get().simulation.is_running() {
									"Stop Simulation"
								} else {
									"Run Simulation"
								}
							}}
						</button>
						<button on:click=move |_| send(UserAction::GenerateRandomEdges)>"Random Flows"</button>
						<button on:click=move |_| send(UserAction::ClearEdges)>"Clear Flows"</button>
						<button on:click=move |_| send(UserAction::Reset)>"Reset"</button>
					</div>

					<div class="flow-form">
						<label>"From "</label>
						<select
							prop:value=move || source.get()
							on:change=move |ev| source.set(event_target_value(&ev))
						>
							{node_options(&nodes)}
						</select>
						<label>" to "</label>
						<select
							prop:value=move || target.get()
							on:change=move |ev| target.set(event_target_value(&ev))
						>
							{node_options(&nodes)}
						</select>
						<label>" rate "</label>
						<input
							type="number"
							min="1"
							max="20"
							prop:value=move || rate.get().to_string()
							on:input=move |ev| {
								if let Ok(value) = event_target_value(&ev).parse::<u32>() {
									rate.set(value);
								}
							}
						/>
						<button on:click=add_flow>"Add Flow"</button>
						<button on:click=remove_flow>"Remove Flow"</button>
					</div>

					<div class="size-controls">
						<label>"Manual Size Control: "</label>
						<input type="range" min="0.5" max="2" step="0.1" value="1" on:input=rescale />
						<select on:change=move |ev| scale_target.set(event_target_value(&ev))>
							<option value=ALL_NODES>"All Circles"</option>
							{node_options(&nodes)}
						</select>
					</div>

					<p class="status">{move || status.get().summary()}</p>
					<p class="error">{move || status.get().message.unwrap_or_default()}</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
