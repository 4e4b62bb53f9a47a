//! Perspective camera with an optional thin lens.

use lumen_math::{Mat4, Ray, Vec2, Vec3, Vec4};

/// Pinhole or thin-lens perspective camera.
///
/// Ray generation goes through the inverse view and projection matrices,
/// so the camera can be swapped for any other projection without touching
/// the integrator.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    eye: Vec3,
    look_at: Vec3,
    up: Vec3,
    /// Vertical field of view in degrees
    fov_y: f32,
    z_near: f32,
    z_far: f32,
    /// Distance from the lens to the plane in perfect focus
    pub focal_length: f32,
    /// Lens diameter; zero gives a pinhole
    pub aperture_size: f32,
    aspect: f32,
    view_inverse: Mat4,
    proj_inverse: Mat4,
}

impl Camera {
    pub fn new() -> Self {
        let mut camera = Self {
            eye: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            up: Vec3::Y,
            fov_y: 45.0,
            z_near: 0.01,
            z_far: 1000.0,
            focal_length: 1.0,
            aperture_size: 0.0,
            aspect: 1.0,
            view_inverse: Mat4::IDENTITY,
            proj_inverse: Mat4::IDENTITY,
        };
        camera.update_matrices();
        camera
    }

    pub fn with_position(mut self, eye: Vec3, look_at: Vec3, up: Vec3) -> Self {
        self.eye = eye;
        self.look_at = look_at;
        self.up = up;
        self.update_matrices();
        self
    }

    pub fn with_fov(mut self, fov_y_degrees: f32) -> Self {
        self.fov_y = fov_y_degrees;
        self.update_matrices();
        self
    }

    pub fn with_lens(mut self, focal_length: f32, aperture_size: f32) -> Self {
        self.focal_length = focal_length;
        self.aperture_size = aperture_size;
        self
    }

    /// Match the projection to the image aspect ratio.
    pub fn update_image_size(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
        self.update_matrices();
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn view_inverse(&self) -> Mat4 {
        self.view_inverse
    }

    pub fn projection_inverse(&self) -> Mat4 {
        self.proj_inverse
    }

    fn update_matrices(&mut self) {
        let view = Mat4::look_at_rh(self.eye, self.look_at, self.up);
        let proj = Mat4::perspective_rh(
            self.fov_y.to_radians(),
            self.aspect,
            self.z_near,
            self.z_far,
        );
        self.view_inverse = view.inverse();
        self.proj_inverse = proj.inverse();
    }

    /// Primary ray through a screen position.
    ///
    /// `screen` is in `[0, 1]^2` with `(0, 0)` at the top-left of the image.
    /// `lens` is a point in the unit disk, only used when the aperture is
    /// open.
    pub fn ray(&self, screen: Vec2, lens: Vec2) -> Ray {
        let ndc = Vec2::new(screen.x * 2.0 - 1.0, 1.0 - screen.y * 2.0);
        let target = self.proj_inverse * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let direction = (target.truncate() / target.w).normalize();

        let (origin, direction) = if self.aperture_size > 0.0 {
            // Camera space looks down -Z
            let focal_point = direction * (self.focal_length / -direction.z);
            let lens_point = (lens * (self.aperture_size * 0.5)).extend(0.0);
            (lens_point, (focal_point - lens_point).normalize())
        } else {
            (Vec3::ZERO, direction)
        };

        Ray::new(
            self.view_inverse.transform_point3(origin),
            self.view_inverse.transform_vector3(direction).normalize(),
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
