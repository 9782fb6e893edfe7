use super::state::{NoticeLevel, TransferProgress};
use super::EdgeUploader;
use crate::download::FolderNode;
use crate::upload::CandidateStatus;
use crate::utils::file_size::format_size;
use eframe::egui::{self, Align, Color32, RichText};

const ACCENT: Color32 = Color32::from_rgb(28, 138, 160);
const OK_GREEN: Color32 = Color32::from_rgb(0, 180, 0);
const ERR_RED: Color32 = Color32::from_rgb(220, 50, 50);
const DIM_GREY: Color32 = Color32::from_rgb(150, 150, 150);

impl EdgeUploader {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let total_height = ui.available_height();
            let footer_height = 40.0;
            let footer_margin = 15.0;
            let content_height = total_height - footer_height - footer_margin;

            egui::ScrollArea::vertical()
                .id_source("content")
                .max_height(content_height)
                .show(ui, |ui| {
                    ui.add_space(20.0);
                    ui.vertical_centered(|ui| {
                        ui.heading("EDGE Batch Uploader");
                        ui.add_space(5.0);
                        ui.label(
                            RichText::new(
                                "Bulk-upload sequence files and download workflow results",
                            )
                            .color(ui.visuals().text_color().gamma_multiply(0.7)),
                        );
                    });

                    ui.add_space(20.0);
                    self.render_session(ui);
                    ui.add_space(15.0);
                    self.render_quota(ui);
                    ui.add_space(15.0);
                    self.render_queue(ui);
                    ui.add_space(15.0);

                    if !matches!(self.state.progress, TransferProgress::Idle) {
                        self.render_progress(ui);
                        ui.add_space(15.0);
                    }

                    if !self.state.notices.is_empty() {
                        self.render_notices(ui);
                        ui.add_space(15.0);
                    }

                    self.render_results(ui);
                    ui.add_space(20.0);
                });

            ui.with_layout(egui::Layout::bottom_up(Align::Center), |ui| {
                ui.add_space(footer_margin);
                self.render_footer(ui);
            });
        });
    }

    fn render_session(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Paste a curl request from the portal");
                ui.add_space(4.0);
                ui.label("ℹ").on_hover_text_at_pointer(
                    "To capture your session:\n\
                    1. Log in to the portal in your browser\n\
                    2. Open Developer Tools (F12), Network tab\n\
                    3. Open the Upload Files page\n\
                    4. Right-click the 'upload/info' request\n\
                    5. Copy as cURL and paste it here",
                );
            });

            ui.add_space(8.0);
            egui::ScrollArea::vertical()
                .id_source("curl")
                .max_height(100.0)
                .show(ui, |ui| {
                    let text_edit = egui::TextEdit::multiline(&mut self.curl_text)
                        .desired_width(ui.available_width())
                        .font(egui::TextStyle::Monospace)
                        .hint_text("curl 'https://<portal-host>/auth-api/user/upload/info' ...");
                    ui.add_sized([ui.available_width(), 100.0], text_edit);
                });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label("Project code:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.project_code)
                        .desired_width(180.0)
                        .hint_text("optional, for results"),
                );
                let connect_label = if self.session.is_some() {
                    "⟳ Refresh"
                } else {
                    "🔗 Connect"
                };
                let can_connect = !self.curl_text.is_empty() && !self.state.busy();
                ui.add_enabled_ui(can_connect, |ui| {
                    if ui.button(connect_label).clicked() {
                        self.connect();
                    }
                });
            });
        });
    }

    fn render_quota(&self, ui: &mut egui::Ui) {
        let Some(quota) = &self.state.quota else {
            return;
        };
        let staged = self.queue.staged_size();
        ui.group(|ui| {
            ui.label(format!(
                "Storage: {} of {} used, {} staged locally",
                format_size(quota.used_bytes),
                format_size(quota.max_total_bytes),
                format_size(staged),
            ));
            let fraction = if quota.max_total_bytes == 0 {
                0.0
            } else {
                (quota.used_bytes + staged) as f32 / quota.max_total_bytes as f32
            };
            ui.add(egui::ProgressBar::new(fraction.min(1.0)).fill(ACCENT));
            ui.label(
                RichText::new(format!(
                    "Uploads are kept for {} days; single files up to {}",
                    quota.retention_days,
                    format_size(quota.max_single_file_bytes),
                ))
                .color(DIM_GREY),
            );
        });
    }

    fn render_queue(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.add_enabled_ui(!self.state.busy(), |ui| {
                    if ui.button("📄 Add Files").clicked() {
                        self.add_files();
                    }
                    if ui.button("📁 Add Folder").clicked() {
                        self.add_folder();
                    }
                });
                ui.label("Files listed in .gitignore are skipped when adding a folder");
            });

            let mut remove_id = None;
            for candidate in self.queue.visible() {
                ui.horizontal(|ui| {
                    let (icon, color) = match &candidate.status {
                        CandidateStatus::Queued => ("📄", ui.visuals().text_color()),
                        CandidateStatus::Uploading => ("⏳", DIM_GREY),
                        CandidateStatus::Done => ("✅", OK_GREEN),
                        CandidateStatus::Error(_) => ("❌", ERR_RED),
                        CandidateStatus::Removed => return,
                    };
                    ui.label(icon);
                    ui.colored_label(color, &candidate.name);
                    ui.label(RichText::new(format_size(candidate.size_bytes)).color(DIM_GREY));
                    if candidate.status == CandidateStatus::Queued
                        && ui.small_button("✖").clicked()
                    {
                        remove_id = Some(candidate.local_id);
                    }
                });
            }
            if let Some(id) = remove_id {
                self.queue.remove(id);
            }

            if !self.queue.is_empty() {
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    let can_upload = self.session.is_some()
                        && self.state.quota.is_some()
                        && self.queue.staged_count() > 0
                        && !self.state.busy();
                    ui.add_enabled_ui(can_upload, |ui| {
                        let button = egui::Button::new(format!(
                            "📤 Upload {} file(s) ({})",
                            self.queue.staged_count(),
                            format_size(self.queue.staged_size()),
                        ))
                        .min_size(egui::vec2(220.0, 36.0));
                        if ui.add(button).clicked() {
                            self.start_upload();
                        }
                    });
                });
            }
        });
    }

    fn render_progress(&self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            let progress_bar = egui::ProgressBar::new(self.state.progress.percentage())
                .show_percentage()
                .animate(self.state.busy())
                .fill(ACCENT);
            ui.add(progress_bar);
            ui.label(self.state.progress.status_text());
        });
    }

    fn render_notices(&mut self, ui: &mut egui::Ui) {
        if ui
            .button(if self.state.show_details {
                "Hide Details"
            } else {
                "Show Details"
            })
            .clicked()
        {
            self.state.show_details = !self.state.show_details;
        }

        if self.state.show_details {
            egui::ScrollArea::vertical()
                .id_source("notices")
                .max_height(200.0)
                .show(ui, |ui| {
                    egui::Frame::none()
                        .fill(ui.style().visuals.extreme_bg_color)
                        .show(ui, |ui| {
                            ui.add_space(8.0);
                            for notice in &self.state.notices {
                                let (icon, color) = match notice.level {
                                    NoticeLevel::Info => ("ℹ", DIM_GREY),
                                    NoticeLevel::Success => ("✅", OK_GREEN),
                                    NoticeLevel::Error => ("❌", ERR_RED),
                                };
                                ui.horizontal(|ui| {
                                    ui.label(icon);
                                    ui.colored_label(color, &notice.text);
                                });
                                ui.add_space(4.0);
                            }
                            ui.add_space(8.0);
                        });
                });
        }
    }

    fn render_results(&mut self, ui: &mut egui::Ui) {
        if self.state.outputs.is_empty() {
            return;
        }
        let mut requested = None;
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Project outputs ({} files)", self.state.outputs.len()));
                ui.add_enabled_ui(!self.state.busy(), |ui| {
                    if ui.button("⬇ Download all").clicked() {
                        requested = Some(String::new());
                    }
                });
            });
            ui.add_space(4.0);
            egui::ScrollArea::vertical()
                .id_source("results")
                .max_height(260.0)
                .show(ui, |ui| {
                    let enabled = !self.state.busy();
                    Self::render_node(ui, &self.state.output_tree, "", enabled, &mut requested);
                });
        });
        if let Some(folder) = requested {
            self.start_download(&folder);
        }
    }

    fn render_node(
        ui: &mut egui::Ui,
        node: &FolderNode,
        path: &str,
        enabled: bool,
        requested: &mut Option<String>,
    ) {
        for (name, child) in &node.dirs {
            let child_path = if path.is_empty() {
                name.clone()
            } else {
                format!("{path}/{name}")
            };
            egui::CollapsingHeader::new(format!("🗀 {name}"))
                .id_source(&child_path)
                .show(ui, |ui| {
                    ui.add_enabled_ui(enabled, |ui| {
                        if ui.small_button("⬇ Download folder").clicked() {
                            *requested = Some(child_path.clone());
                        }
                    });
                    Self::render_node(ui, child, &child_path, enabled, requested);
                });
        }
        for file in &node.files {
            ui.horizontal(|ui| {
                ui.label(&file.name);
                ui.label(RichText::new(format_size(file.size)).color(DIM_GREY));
            });
        }
    }

    fn render_footer(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            if let Some(session) = &self.session {
                if ui
                    .add(
                        egui::Label::new(RichText::new("Open portal").color(ACCENT))
                            .sense(egui::Sense::click()),
                    )
                    .clicked()
                {
                    let _ = open::that(&session.base_url);
                }
            }
            if let Some(error) = &self.state.error_message {
                ui.add_space(5.0);
                ui.colored_label(ERR_RED, error);
            }
        });
    }
}
